use mongo_bulk::bulk::mixed::{partition_ordered, partition_unordered};
use mongo_bulk::bulk::{BulkMixedWriteOperation, RequestType, WriteRequest};
use mongo_bulk::coll::options::BulkWriteOptions;
use mongo_bulk::Error;

use crate::mock::{acknowledge_all, items, scripted, MockConnection};

fn insert(i: usize) -> WriteRequest {
    WriteRequest::insert(i, doc! { "_id": i as i32 })
}

fn update(i: usize) -> WriteRequest {
    WriteRequest::update(i, doc! { "_id": i as i32 }, doc! { "$inc": { "n": 1 } }, None, None)
}

fn delete(i: usize) -> WriteRequest {
    WriteRequest::delete(i, doc! { "_id": i as i32 }, 1)
}

fn shape(runs: &[(RequestType, Vec<WriteRequest>)]) -> Vec<(RequestType, Vec<usize>)> {
    runs.iter()
        .map(|&(request_type, ref requests)| {
            (request_type, requests.iter().map(|r| r.original_index()).collect())
        })
        .collect()
}

#[test]
fn ordered_partition_keeps_runs() {
    let runs = partition_ordered(vec![insert(0), insert(1), update(2), insert(3), delete(4), delete(5)]);

    assert_eq!(
        vec![
            (RequestType::Insert, vec![0, 1]),
            (RequestType::Update, vec![2]),
            (RequestType::Insert, vec![3]),
            (RequestType::Delete, vec![4, 5]),
        ],
        shape(&runs)
    );
}

#[test]
fn unordered_partition_groups_by_first_appearance() {
    let runs = partition_unordered(vec![update(0), insert(1), update(2), delete(3), insert(4)]);

    assert_eq!(
        vec![
            (RequestType::Update, vec![0, 2]),
            (RequestType::Insert, vec![1, 4]),
            (RequestType::Delete, vec![3]),
        ],
        shape(&runs)
    );
}

#[test]
fn empty_bulk_write_is_rejected() {
    let mut conn = MockConnection::modern(acknowledge_all);

    match BulkMixedWriteOperation::new("test", "c", Vec::new(), BulkWriteOptions::new()).execute(&mut conn) {
        Err(Error::ArgumentError(_)) => (),
        other => panic!("Expected an argument error, got {:?}", other),
    }
    assert!(conn.sent.is_empty());
}

#[test]
fn invalid_request_fails_before_anything_is_sent() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let requests = vec![insert(0), WriteRequest::delete(1, doc! {}, 5)];

    match BulkMixedWriteOperation::new("test", "c", requests, BulkWriteOptions::new()).execute(&mut conn) {
        Err(Error::ArgumentError(_)) => (),
        other => panic!("Expected an argument error, got {:?}", other),
    }
    assert!(conn.sent.is_empty());
}

#[test]
fn ordered_runs_are_sent_in_sequence() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let requests = vec![insert(0), insert(1), update(2), delete(3), insert(4)];

    let result = BulkMixedWriteOperation::new("test", "c", requests, BulkWriteOptions::new())
        .execute(&mut conn)
        .unwrap();

    let verbs: Vec<(String, usize)> = conn.commands().iter()
        .map(|command| (command.keys().next().unwrap().clone(), items(command).len()))
        .collect();

    assert_eq!(
        vec![
            (String::from("insert"), 2),
            (String::from("update"), 1),
            (String::from("delete"), 1),
            (String::from("insert"), 1),
        ],
        verbs
    );

    assert_eq!(5, result.request_count);
    assert_eq!(3, result.inserted_count);
    assert_eq!(1, result.matched_count);
    assert_eq!(Some(1), result.modified_count);
    assert_eq!(1, result.deleted_count);
}

#[test]
fn unordered_groups_are_sent_once_per_type() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let requests = vec![insert(0), update(1), insert(2), delete(3), update(4)];

    BulkMixedWriteOperation::new("test", "c", requests, BulkWriteOptions::unordered())
        .execute(&mut conn)
        .unwrap();

    let commands = conn.commands();
    assert_eq!(3, commands.len());
    assert_eq!(2, items(&conn.commands_named("insert")[0]).len());
    assert_eq!(2, items(&conn.commands_named("update")[0]).len());
    assert_eq!(1, items(&conn.commands_named("delete")[0]).len());
}

#[test]
fn ordered_write_stops_at_failed_run() {
    let mut conn = MockConnection::modern(scripted(vec![
        doc! { "ok": 1, "n": 1 },
        doc! { "ok": 1, "n": 0, "writeErrors": [{ "index": 0, "code": 2, "errmsg": "bad update" }] },
    ]));
    let requests = vec![insert(0), update(1), delete(2), insert(3)];

    match BulkMixedWriteOperation::new("test", "c", requests, BulkWriteOptions::new()).execute(&mut conn) {
        Err(Error::BulkWriteError(exception)) => {
            assert_eq!(2, conn.commands().len());
            assert_eq!(4, exception.result.request_count);
            assert_eq!(1, exception.result.inserted_count);
            assert_eq!(1, exception.write_errors[0].index);

            let unprocessed: Vec<usize> = exception.unprocessed_requests.iter().map(|r| r.original_index()).collect();
            assert_eq!(vec![2, 3], unprocessed);
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}

#[test]
fn unordered_write_reports_errors_at_original_positions() {
    let mut conn = MockConnection::modern(scripted(vec![
        doc! { "ok": 1, "n": 2, "writeErrors": [{ "index": 1, "code": 11000, "errmsg": "duplicate key" }] },
        doc! { "ok": 1, "n": 1 },
    ]));
    let requests = vec![insert(0), delete(1), insert(2), insert(3)];

    match BulkMixedWriteOperation::new("test", "c", requests, BulkWriteOptions::unordered()).execute(&mut conn) {
        Err(Error::BulkWriteError(exception)) => {
            assert_eq!(2, conn.commands().len());
            assert_eq!(2, exception.write_errors[0].index);
            assert_eq!(2, exception.result.inserted_count);
            assert_eq!(1, exception.result.deleted_count);
            assert!(exception.unprocessed_requests.is_empty());
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}
