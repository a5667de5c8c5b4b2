//! Merges per-batch results into the outcome of a whole bulk write.
use crate::bulk::batch_result::BulkWriteBatchResult;
use crate::bulk::request::WriteRequest;
use crate::coll::error::{BulkWriteError, BulkWriteException, WriteConcernError};
use crate::coll::results::{BulkWriteResult, BulkWriteUpsert};
use crate::error::{Error, Result};

pub struct BulkWriteBatchResultCombiner<'a> {
    batch_results: &'a [BulkWriteBatchResult],
    is_acknowledged: bool,
}

impl<'a> BulkWriteBatchResultCombiner<'a> {
    /// `is_acknowledged` reflects the write concern the operation ran with; any unacknowledged
    /// batch also makes the combined result unacknowledged.
    pub fn new(batch_results: &'a [BulkWriteBatchResult], is_acknowledged: bool) -> BulkWriteBatchResultCombiner<'a> {
        BulkWriteBatchResultCombiner {
            batch_results: batch_results,
            is_acknowledged: is_acknowledged && batch_results.iter().all(|r| r.acknowledged),
        }
    }

    /// Returns the combined result, or a `BulkWriteError` carrying it as a partial result when
    /// any batch reported write errors or a write concern error.
    ///
    /// `remaining` holds requests that were never sent, which count toward the request count
    /// and are reported as unprocessed.
    pub fn create_result_or_throw(&self, remaining: Vec<WriteRequest>) -> Result<BulkWriteResult> {
        let result = self.create_result(remaining.len());

        if !result.acknowledged {
            return Ok(result);
        }

        let write_errors = self.combine_write_errors();
        let write_concern_error = self.combine_write_concern_errors();

        if write_errors.is_empty() && write_concern_error.is_none() {
            return Ok(result);
        }

        let mut unprocessed_requests: Vec<WriteRequest> = self.batch_results.iter()
            .flat_map(|r| r.unprocessed_requests.iter().cloned())
            .collect();
        unprocessed_requests.extend(remaining);

        tracing::debug!(
            write_errors = write_errors.len(),
            write_concern_error = write_concern_error.is_some(),
            unprocessed = unprocessed_requests.len(),
            "bulk write completed with errors"
        );

        Err(Error::BulkWriteError(BulkWriteException::new(
            result,
            write_errors,
            write_concern_error,
            unprocessed_requests,
        )))
    }

    fn create_result(&self, remaining_count: usize) -> BulkWriteResult {
        let request_count = self.batch_results.iter().map(|r| r.batch_count).sum::<usize>() + remaining_count;

        let mut processed_requests: Vec<WriteRequest> = self.batch_results.iter()
            .flat_map(|r| r.processed_requests.iter().cloned())
            .collect();
        processed_requests.sort_by_key(|r| r.original_index());

        if !self.is_acknowledged {
            return BulkWriteResult::unacknowledged(request_count, processed_requests);
        }

        let mut result = BulkWriteResult::new(request_count, processed_requests);

        for batch in self.batch_results {
            result.inserted_count += batch.inserted_count;
            result.matched_count += batch.matched_count;
            result.deleted_count += batch.deleted_count;
            result.modified_count = match (result.modified_count, batch.modified_count) {
                (Some(total), Some(n)) => Some(total + n),
                _ => None,
            };
        }

        result.upserts = self.combine_upserts();
        result
    }

    fn combine_upserts(&self) -> Vec<BulkWriteUpsert> {
        let mut upserts: Vec<BulkWriteUpsert> = self.batch_results.iter()
            .flat_map(|batch| {
                batch.upserts.iter().map(move |upsert| BulkWriteUpsert {
                    index: remap(batch, upsert.index),
                    id: upsert.id.clone(),
                })
            })
            .collect();

        upserts.sort_by_key(|upsert| upsert.index);
        upserts
    }

    fn combine_write_errors(&self) -> Vec<BulkWriteError> {
        let mut write_errors: Vec<BulkWriteError> = self.batch_results.iter()
            .flat_map(|batch| {
                batch.write_errors.iter().map(move |error| BulkWriteError {
                    index: remap(batch, error.index),
                    ..error.clone()
                })
            })
            .collect();

        write_errors.sort_by_key(|error| error.index);
        write_errors
    }

    /// Only the last write concern error is kept.
    fn combine_write_concern_errors(&self) -> Option<WriteConcernError> {
        self.batch_results.iter()
            .filter_map(|batch| batch.write_concern_error.clone())
            .last()
    }
}

fn remap(batch: &BulkWriteBatchResult, index: usize) -> usize {
    match batch.index_map.map(index) {
        Some(original_index) => original_index,
        None => {
            tracing::warn!(index = index, "server reported an index outside of the batch");
            index
        }
    }
}
