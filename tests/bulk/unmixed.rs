use bson::Bson;
use mongo_bulk::bulk::{BulkUnmixedWriteOperation, RequestType, WriteRequest};
use mongo_bulk::coll::options::BulkWriteOptions;
use mongo_bulk::common::WriteConcern;
use mongo_bulk::server::ConnectionDescription;
use mongo_bulk::Error;
use semver::Version;

use crate::mock::{acknowledge_all, items, scripted, MockConnection};

fn inserts(count: usize) -> Vec<WriteRequest> {
    (0..count).map(|i| WriteRequest::insert(i, doc! { "_id": i as i32 })).collect()
}

fn options(ordered: bool, max_batch_count: Option<usize>) -> BulkWriteOptions {
    BulkWriteOptions {
        ordered: ordered,
        max_batch_count: max_batch_count,
        ..Default::default()
    }
}

#[test]
fn three_inserts_in_two_round_trips() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let operation = BulkUnmixedWriteOperation::new("test", "people", RequestType::Insert, inserts(3).into_iter(),
                                                   &options(true, Some(2)));

    let result = operation.execute(&mut conn).unwrap();
    assert_eq!(3, result.inserted_count);
    assert_eq!(3, result.request_count);

    let commands = conn.commands_named("insert");
    assert_eq!(2, commands.len());
    assert_eq!(2, items(&commands[0]).len());
    assert_eq!(1, items(&commands[1]).len());

    for command in &commands {
        assert_eq!(Some(&Bson::String(String::from("people"))), command.get("insert"));
        assert_eq!(Some(&Bson::Boolean(true)), command.get("ordered"));
        assert!(!command.contains_key("writeConcern"));
    }

    // Sent to the database's command namespace.
    match conn.sent[0] {
        mongo_bulk::wire_protocol::operations::Message::OpQuery { ref namespace, number_to_return, .. } => {
            assert_eq!("test.$cmd", namespace);
            assert_eq!(-1, number_to_return);
        }
        ref other => panic!("Expected a query, got {:?}", other),
    }
}

#[test]
fn non_default_write_concern_is_sent() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let mut write_concern = WriteConcern::new();
    write_concern.w = 2;
    write_concern.w_timeout = 100;

    let options = BulkWriteOptions { write_concern: Some(write_concern), ..Default::default() };
    BulkUnmixedWriteOperation::new("test", "people", RequestType::Insert, inserts(1).into_iter(), &options)
        .execute(&mut conn)
        .unwrap();

    let command = &conn.commands()[0];
    assert_eq!(Some(&Bson::Document(doc! { "w": 2, "wtimeout": 100, "j": false })), command.get("writeConcern"));
}

#[test]
fn unacknowledged_write_concern() {
    let mut conn = MockConnection::modern(acknowledge_all);
    let options = BulkWriteOptions { write_concern: Some(WriteConcern::unacknowledged()), ..Default::default() };

    let result = BulkUnmixedWriteOperation::new("test", "people", RequestType::Insert, inserts(2).into_iter(),
                                                &options)
        .execute(&mut conn)
        .unwrap();

    assert!(!result.acknowledged);
    assert_eq!(2, result.processed_requests.len());
    assert_eq!(0, result.inserted_count);

    let command = &conn.commands()[0];
    assert_eq!(Some(&Bson::Document(doc! { "w": 0, "wtimeout": 0, "j": false })), command.get("writeConcern"));
}

#[test]
fn bypass_document_validation_requires_server_support() {
    let options = BulkWriteOptions { bypass_document_validation: Some(true), ..Default::default() };

    let mut conn = MockConnection::modern(acknowledge_all);
    BulkUnmixedWriteOperation::new("test", "c", RequestType::Insert, inserts(1).into_iter(), &options)
        .execute(&mut conn)
        .unwrap();
    assert_eq!(Some(&Bson::Boolean(true)), conn.commands()[0].get("bypassDocumentValidation"));

    let mut conn = MockConnection::new(ConnectionDescription::new(Version::new(3, 0, 0), 3), acknowledge_all);
    BulkUnmixedWriteOperation::new("test", "c", RequestType::Insert, inserts(1).into_iter(), &options)
        .execute(&mut conn)
        .unwrap();
    assert!(!conn.commands()[0].contains_key("bypassDocumentValidation"));
}

#[test]
fn ordered_execution_stops_after_failed_batch() {
    let mut conn = MockConnection::modern(scripted(vec![
        doc! { "ok": 1, "n": 0, "writeErrors": [{ "index": 0, "code": 11000, "errmsg": "duplicate key" }] },
    ]));

    let execution = BulkUnmixedWriteOperation::new("test", "c", RequestType::Insert, inserts(5).into_iter(),
                                                   &options(true, Some(2)))
        .execute_batches(&mut conn)
        .unwrap();

    assert_eq!(1, conn.commands().len());
    assert!(execution.has_write_errors());
    assert_eq!(1, execution.batch_results.len());
    assert_eq!(1, execution.batch_results[0].unprocessed_requests.len());

    let remaining: Vec<usize> = execution.remaining.iter().map(|r| r.original_index()).collect();
    assert_eq!(vec![2, 3, 4], remaining);
}

#[test]
fn unordered_execution_runs_every_batch() {
    let mut conn = MockConnection::modern(scripted(vec![
        doc! { "ok": 1, "n": 1, "writeErrors": [{ "index": 0, "code": 11000, "errmsg": "duplicate key" }] },
        doc! { "ok": 1, "n": 2 },
        doc! { "ok": 1, "n": 1 },
    ]));

    let operation = BulkUnmixedWriteOperation::new("test", "c", RequestType::Insert, inserts(5).into_iter(),
                                                   &options(false, Some(2)));

    match operation.execute(&mut conn) {
        Err(Error::BulkWriteError(exception)) => {
            assert_eq!(3, conn.commands().len());
            assert_eq!(4, exception.result.inserted_count);
            assert_eq!(5, exception.result.processed_requests.len());
            assert_eq!(1, exception.write_errors.len());
            assert_eq!(0, exception.write_errors[0].index);
            assert!(exception.unprocessed_requests.is_empty());
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}

#[test]
fn failed_command_is_an_operation_error() {
    let mut conn = MockConnection::modern(scripted(vec![
        doc! { "ok": 0, "errmsg": "not master", "code": 10107 },
    ]));

    let result = BulkUnmixedWriteOperation::new("test", "c", RequestType::Delete,
                                                vec![WriteRequest::delete(0, doc! {}, 0)].into_iter(),
                                                &BulkWriteOptions::new())
        .execute(&mut conn);

    match result {
        Err(Error::OperationError(message)) => assert_eq!("not master", message),
        other => panic!("Expected an operation error, got {:?}", other),
    }
}

#[test]
fn legacy_server_is_emulated() {
    let mut conn = MockConnection::legacy(acknowledge_all);

    let result = BulkUnmixedWriteOperation::new("test", "c", RequestType::Insert, inserts(3).into_iter(),
                                                &options(true, Some(2)))
        .execute(&mut conn)
        .unwrap();

    assert_eq!(3, result.inserted_count);
    assert_eq!(3, conn.legacy_writes().len());
    assert_eq!(3, conn.commands_named("getLastError").len());
    assert!(conn.commands_named("insert").is_empty());
}
