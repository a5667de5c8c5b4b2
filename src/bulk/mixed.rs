//! Executes a bulk write whose requests may mix inserts, updates and deletes.
use crate::bulk::batch_result::BulkWriteBatchResult;
use crate::bulk::combiner::BulkWriteBatchResultCombiner;
use crate::bulk::request::{RequestType, WriteRequest};
use crate::bulk::unmixed::BulkUnmixedWriteOperation;
use crate::coll::options::BulkWriteOptions;
use crate::coll::results::BulkWriteResult;
use crate::connection::Connection;
use crate::error::{Error, Result};

/// Splits a mixed request sequence into single-type runs and executes them in turn.
///
/// Ordered operations run contiguous same-type runs in sequence and stop after the first run
/// that reports a write error. Unordered operations group every request by type, in order of
/// each type's first appearance, and always run every group.
pub struct BulkMixedWriteOperation {
    db_name: String,
    collection_name: String,
    requests: Vec<WriteRequest>,
    options: BulkWriteOptions,
}

impl BulkMixedWriteOperation {
    pub fn new(
        db_name: &str,
        collection_name: &str,
        requests: Vec<WriteRequest>,
        options: BulkWriteOptions,
    ) -> BulkMixedWriteOperation {
        BulkMixedWriteOperation {
            db_name: db_name.to_owned(),
            collection_name: collection_name.to_owned(),
            requests: requests,
            options: options,
        }
    }

    pub fn execute(self, conn: &mut dyn Connection) -> Result<BulkWriteResult> {
        if self.requests.is_empty() {
            return Err(Error::ArgumentError(String::from("A bulk write requires at least one request.")));
        }

        for request in &self.requests {
            request.validate()?;
        }

        let ordered = self.options.ordered;
        let is_acknowledged = self.options.write_concern.clone().unwrap_or_default().is_acknowledged();

        let runs = if ordered {
            partition_ordered(self.requests)
        } else {
            partition_unordered(self.requests)
        };

        let mut batch_results: Vec<BulkWriteBatchResult> = Vec::new();
        let mut remaining: Vec<WriteRequest> = Vec::new();
        let mut runs = runs.into_iter();

        while let Some((request_type, requests)) = runs.next() {
            let operation = BulkUnmixedWriteOperation::new(
                &self.db_name,
                &self.collection_name,
                request_type,
                requests.into_iter(),
                &self.options,
            );

            let execution = operation.execute_batches(conn)?;
            let stop = ordered && execution.has_write_errors();

            batch_results.extend(execution.batch_results);
            remaining.extend(execution.remaining);

            if stop {
                for (_, requests) in runs.by_ref() {
                    remaining.extend(requests);
                }
                break;
            }
        }

        BulkWriteBatchResultCombiner::new(&batch_results, is_acknowledged)
            .create_result_or_throw(remaining)
    }
}

/// Splits requests into maximal runs of consecutive requests of the same type.
pub fn partition_ordered(requests: Vec<WriteRequest>) -> Vec<(RequestType, Vec<WriteRequest>)> {
    let mut runs: Vec<(RequestType, Vec<WriteRequest>)> = Vec::new();

    for request in requests {
        let request_type = request.request_type();
        let continues = runs.last().map_or(false, |&(last_type, _)| last_type == request_type);

        if continues {
            if let Some(&mut (_, ref mut run)) = runs.last_mut() {
                run.push(request);
            }
        } else {
            runs.push((request_type, vec![request]));
        }
    }

    runs
}

/// Groups requests by type, in order of each type's first appearance.
pub fn partition_unordered(requests: Vec<WriteRequest>) -> Vec<(RequestType, Vec<WriteRequest>)> {
    let mut groups: Vec<(RequestType, Vec<WriteRequest>)> = Vec::new();

    for request in requests {
        let request_type = request.request_type();
        match groups.iter().position(|&(group_type, _)| group_type == request_type) {
            Some(position) => groups[position].1.push(request),
            None => groups.push((request_type, vec![request])),
        }
    }

    groups
}
