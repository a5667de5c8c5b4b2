//! Executes a stream of write requests of a single type.
use bson::{self, Bson};
use crate::bulk::batch_result::BulkWriteBatchResult;
use crate::bulk::buffer::WriteBuffer;
use crate::bulk::combiner::BulkWriteBatchResultCombiner;
use crate::bulk::emulator::BulkWriteEmulator;
use crate::bulk::index_map::IndexMap;
use crate::bulk::request::{RequestType, WriteRequest};
use crate::bulk::serializer::{BatchLimits, BatchSerializer};
use crate::bulk::source::BatchableSource;
use crate::coll::options::BulkWriteOptions;
use crate::coll::results::BulkWriteResult;
use crate::command;
use crate::common::WriteConcern;
use crate::connection::Connection;
use crate::error::Result;
use crate::server::FeatureId;

use std::vec;

/// The batch results of an execution, plus the requests that were never sent because an
/// ordered operation stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmixedExecution {
    pub batch_results: Vec<BulkWriteBatchResult>,
    pub remaining: Vec<WriteRequest>,
}

impl UnmixedExecution {
    /// Whether an ordered caller must stop after this execution.
    pub fn has_write_errors(&self) -> bool {
        self.batch_results.iter().any(|r| r.has_write_errors())
    }
}

/// A bulk write whose requests all share one type.
///
/// Against servers with write commands the requests are sent as `insert`, `update` or
/// `delete` commands, split into as many batches as the server limits require. Older servers
/// get one legacy message per request through the emulator.
pub struct BulkUnmixedWriteOperation<I = vec::IntoIter<WriteRequest>>
where
    I: Iterator<Item = WriteRequest>,
{
    db_name: String,
    collection_name: String,
    request_type: RequestType,
    requests: I,
    ordered: bool,
    write_concern: WriteConcern,
    max_batch_count: Option<usize>,
    max_batch_length: Option<usize>,
    bypass_document_validation: Option<bool>,
}

impl<I> BulkUnmixedWriteOperation<I>
where
    I: Iterator<Item = WriteRequest>,
{
    pub fn new(
        db_name: &str,
        collection_name: &str,
        request_type: RequestType,
        requests: I,
        options: &BulkWriteOptions,
    ) -> BulkUnmixedWriteOperation<I> {
        BulkUnmixedWriteOperation {
            db_name: db_name.to_owned(),
            collection_name: collection_name.to_owned(),
            request_type: request_type,
            requests: requests,
            ordered: options.ordered,
            write_concern: options.write_concern.clone().unwrap_or_default(),
            max_batch_count: options.max_batch_count,
            max_batch_length: options.max_batch_length,
            bypass_document_validation: options.bypass_document_validation,
        }
    }

    /// Runs every batch and combines the results.
    pub fn execute(self, conn: &mut dyn Connection) -> Result<BulkWriteResult> {
        let is_acknowledged = self.write_concern.is_acknowledged();
        let execution = self.execute_batches(conn)?;

        BulkWriteBatchResultCombiner::new(&execution.batch_results, is_acknowledged)
            .create_result_or_throw(execution.remaining)
    }

    /// Runs every batch, returning the raw batch results for the caller to combine.
    pub fn execute_batches(self, conn: &mut dyn Connection) -> Result<UnmixedExecution> {
        if !conn.description().supports(FeatureId::WriteCommands) {
            tracing::warn!(
                version = %conn.description().server_version,
                "server does not support write commands, emulating with legacy writes"
            );

            let emulator = BulkWriteEmulator::new(
                &self.db_name,
                &self.collection_name,
                self.requests,
                self.ordered,
                self.write_concern,
            );
            return emulator.execute_batches(conn);
        }

        let limits = BatchLimits::new(conn.description(), self.max_batch_count, self.max_batch_length);
        let serializer = BatchSerializer::new(limits);
        let prefix = self.command_prefix(conn);
        let items_field = self.request_type.items_field();

        let mut source = BatchableSource::new(self.requests);
        let mut buffer = WriteBuffer::new();
        let mut batch_results: Vec<BulkWriteBatchResult> = Vec::new();
        let mut remaining = Vec::new();

        while source.has_more() {
            let stop = self.ordered && batch_results.last().map_or(false, |r| r.has_write_errors());
            if stop {
                remaining = source.get_remaining_items();
                break;
            }

            let progress = serializer.serialize_command(&mut buffer, &prefix, items_field, &mut source)?;
            let command = buffer.take_bytes();

            if progress.batch_count == 0 {
                break;
            }

            tracing::debug!(
                command = self.request_type.command_name(),
                collection = %self.collection_name,
                batch_count = progress.batch_count,
                batch_length = progress.batch_length,
                "sending write command batch"
            );

            let index_map = IndexMap::from_requests(&progress.batch_items);
            let reply = command::run_raw_command(conn, &self.db_name,
                                                 self.request_type.command_type(), command)?;

            let result = if self.write_concern.is_acknowledged() {
                BulkWriteBatchResult::from_command_reply(&reply, progress.batch_items, self.ordered, index_map)?
            } else {
                BulkWriteBatchResult::unacknowledged(progress.batch_items, index_map)
            };

            batch_results.push(result);
        }

        Ok(UnmixedExecution {
            batch_results: batch_results,
            remaining: remaining,
        })
    }

    fn command_prefix(&self, conn: &dyn Connection) -> bson::Document {
        let mut prefix = bson::Document::new();
        prefix.insert(self.request_type.command_name(), Bson::String(self.collection_name.clone()));
        prefix.insert("ordered", self.ordered);

        if !self.write_concern.is_server_default() {
            prefix.insert("writeConcern", self.write_concern.to_bson());
        }

        if let Some(bypass) = self.bypass_document_validation {
            if conn.description().supports(FeatureId::BypassDocumentValidation) {
                prefix.insert("bypassDocumentValidation", bypass);
            }
        }

        prefix
    }
}
