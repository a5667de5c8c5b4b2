use bson::Bson;
use mongo_bulk::bulk::{BulkWriteBatchResult, BulkWriteBatchResultCombiner, IndexMap, WriteRequest};
use mongo_bulk::Error;

fn inserts(indexes: &[usize]) -> Vec<WriteRequest> {
    indexes.iter().map(|&i| WriteRequest::insert(i, doc! { "_id": i as i32 })).collect()
}

fn updates(indexes: &[usize]) -> Vec<WriteRequest> {
    indexes.iter()
        .map(|&i| WriteRequest::update(i, doc! { "_id": i as i32 }, doc! { "$set": { "x": 1 } }, None, Some(true)))
        .collect()
}

#[test]
fn sums_counts_across_batches() {
    let first = inserts(&[0, 1]);
    let second = inserts(&[2]);

    let results = vec![
        BulkWriteBatchResult::from_command_reply(&doc! { "ok": 1, "n": 2 }, first.clone(), true,
                                                 IndexMap::from_requests(&first)).unwrap(),
        BulkWriteBatchResult::from_command_reply(&doc! { "ok": 1, "n": 1 }, second.clone(), true,
                                                 IndexMap::from_requests(&second)).unwrap(),
    ];

    let result = BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()).unwrap();
    assert!(result.acknowledged);
    assert_eq!(3, result.request_count);
    assert_eq!(3, result.inserted_count);
    assert_eq!(Some(0), result.modified_count);

    let order: Vec<usize> = result.processed_requests.iter().map(|r| r.original_index()).collect();
    assert_eq!(vec![0, 1, 2], order);
}

#[test]
fn one_missing_modified_count_taints_the_total() {
    let command_batch = updates(&[0, 1]);
    let legacy_request = updates(&[2]).pop().unwrap();

    let results = vec![
        BulkWriteBatchResult::from_command_reply(&doc! { "ok": 1, "n": 2, "nModified": 2 }, command_batch.clone(),
                                                 true, IndexMap::from_requests(&command_batch)).unwrap(),
        BulkWriteBatchResult::from_legacy(legacy_request, &doc! { "ok": 1, "n": 1, "updatedExisting": true },
                                          IndexMap::range(0, 2, 1)),
    ];

    let result = BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()).unwrap();
    assert_eq!(3, result.matched_count);
    assert_eq!(None, result.modified_count);
    assert!(!result.is_modified_count_available());
}

#[test]
fn write_errors_are_remapped_and_sorted() {
    // An unordered insert group built from positions 0, 3, 4 and 7.
    let batch = inserts(&[0, 3, 4, 7]);
    let reply = doc! {
        "ok": 1,
        "n": 2,
        "writeErrors": [
            { "index": 2, "code": 11000, "errmsg": "duplicate key" },
            { "index": 1, "code": 11000, "errmsg": "duplicate key" }
        ]
    };

    let results = vec![
        BulkWriteBatchResult::from_command_reply(&reply, batch.clone(), false, IndexMap::from_requests(&batch))
            .unwrap(),
    ];

    match BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()) {
        Err(Error::BulkWriteError(exception)) => {
            let indexes: Vec<usize> = exception.write_errors.iter().map(|e| e.index).collect();
            assert_eq!(vec![3, 4], indexes);

            // The failing request is attached.
            assert_eq!(Some(3), exception.write_errors[0].request.as_ref().map(|r| r.original_index()));

            assert_eq!(2, exception.result.inserted_count);
            assert_eq!(4, exception.processed_requests().len());
            assert!(exception.unprocessed_requests.is_empty());
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}

#[test]
fn ordered_batch_stops_after_its_failure() {
    let batch = inserts(&[0, 1, 2]);
    let reply = doc! {
        "ok": 1,
        "n": 1,
        "writeErrors": [{ "index": 1, "code": 11000, "errmsg": "duplicate key" }]
    };

    let batch_result = BulkWriteBatchResult::from_command_reply(&reply, batch.clone(), true,
                                                                IndexMap::from_requests(&batch)).unwrap();
    assert_eq!(2, batch_result.processed_requests.len());
    assert_eq!(1, batch_result.unprocessed_requests.len());

    let remaining = inserts(&[3, 4]);
    let results = vec![batch_result];

    match BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(remaining) {
        Err(Error::BulkWriteError(exception)) => {
            assert_eq!(5, exception.result.request_count);
            assert_eq!(2, exception.result.processed_requests.len());

            let unprocessed: Vec<usize> = exception.unprocessed_requests.iter().map(|r| r.original_index()).collect();
            assert_eq!(vec![2, 3, 4], unprocessed);
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}

#[test]
fn last_write_concern_error_wins() {
    let first = inserts(&[0]);
    let second = inserts(&[1]);

    let results = vec![
        BulkWriteBatchResult::from_command_reply(
            &doc! { "ok": 1, "n": 1, "writeConcernError": { "code": 64, "errmsg": "first" } },
            first.clone(), true, IndexMap::from_requests(&first)).unwrap(),
        BulkWriteBatchResult::from_command_reply(
            &doc! { "ok": 1, "n": 1, "writeConcernError": { "code": 79, "errmsg": "second", "errInfo": { "w": 3 } } },
            second.clone(), true, IndexMap::from_requests(&second)).unwrap(),
    ];

    match BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()) {
        Err(Error::BulkWriteError(exception)) => {
            let error = exception.write_concern_error.unwrap();
            assert_eq!(79, error.code);
            assert_eq!("second", error.message);
            assert_eq!(Some(doc! { "w": 3 }), error.details);

            assert!(exception.write_errors.is_empty());
            assert_eq!(2, exception.result.inserted_count);
        }
        other => panic!("Expected a bulk write error, got {:?}", other),
    }
}

#[test]
fn upserts_are_remapped() {
    let batch = updates(&[1, 4]);
    let reply = doc! {
        "ok": 1,
        "n": 2,
        "nModified": 0,
        "upserted": [{ "index": 1, "_id": "b" }, { "index": 0, "_id": "a" }]
    };

    let results = vec![
        BulkWriteBatchResult::from_command_reply(&reply, batch.clone(), true, IndexMap::from_requests(&batch))
            .unwrap(),
    ];

    let result = BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()).unwrap();
    assert_eq!(0, result.matched_count);
    assert_eq!(2, result.upserted_count());
    assert_eq!(Some(&Bson::String(String::from("a"))), result.upserted_id(1));
    assert_eq!(Some(&Bson::String(String::from("b"))), result.upserted_id(4));
    assert_eq!(vec![1, 4], result.upserts.iter().map(|u| u.index).collect::<Vec<_>>());
}

#[test]
fn unacknowledged_batches_yield_unacknowledged_result() {
    let batch = inserts(&[0, 1]);
    let results = vec![BulkWriteBatchResult::unacknowledged(batch.clone(), IndexMap::from_requests(&batch))];

    let result = BulkWriteBatchResultCombiner::new(&results, true).create_result_or_throw(Vec::new()).unwrap();
    assert!(!result.acknowledged);
    assert_eq!(2, result.request_count);
    assert_eq!(2, result.processed_requests.len());
    assert_eq!(0, result.inserted_count);
    assert_eq!(None, result.modified_count);
}

#[test]
fn empty_write_errors_array_is_a_protocol_error() {
    let batch = inserts(&[0]);
    let reply = doc! { "ok": 1, "n": 0, "writeErrors": [] };

    match BulkWriteBatchResult::from_command_reply(&reply, batch.clone(), true, IndexMap::from_requests(&batch)) {
        Err(Error::ResponseError(_)) => (),
        other => panic!("Expected a response error, got {:?}", other),
    }
}

#[test]
fn malformed_write_error_is_rejected() {
    let batch = inserts(&[0]);
    let reply = doc! { "ok": 1, "n": 0, "writeErrors": [{ "index": 0, "errmsg": "no code" }] };

    match BulkWriteBatchResult::from_command_reply(&reply, batch.clone(), true, IndexMap::from_requests(&batch)) {
        Err(Error::ResponseError(_)) => (),
        other => panic!("Expected a response error, got {:?}", other),
    }
}
