//! Emulates write commands on servers that only understand legacy write opcodes.
use crate::bulk::batch_result::BulkWriteBatchResult;
use crate::bulk::index_map::IndexMap;
use crate::bulk::request::WriteRequest;
use crate::bulk::source::BatchableSource;
use crate::bulk::unmixed::UnmixedExecution;
use crate::command;
use crate::common::WriteConcern;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::server::ConnectionDescription;
use crate::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpUpdateFlags};
use crate::wire_protocol::operations::{ByteLength, Message};

/// Sends each request as its own OP_INSERT, OP_UPDATE or OP_DELETE, followed by a
/// `getLastError` when the write concern is acknowledged. Each request becomes a one-item
/// batch result, so the combined outcome has the same shape as with write commands.
pub struct BulkWriteEmulator<I>
where
    I: Iterator<Item = WriteRequest>,
{
    db_name: String,
    namespace: String,
    requests: I,
    ordered: bool,
    write_concern: WriteConcern,
}

impl<I> BulkWriteEmulator<I>
where
    I: Iterator<Item = WriteRequest>,
{
    pub fn new(
        db_name: &str,
        collection_name: &str,
        requests: I,
        ordered: bool,
        write_concern: WriteConcern,
    ) -> BulkWriteEmulator<I> {
        BulkWriteEmulator {
            db_name: db_name.to_owned(),
            namespace: format!("{}.{}", db_name, collection_name),
            requests: requests,
            ordered: ordered,
            write_concern: write_concern,
        }
    }

    pub fn execute_batches(self, conn: &mut dyn Connection) -> Result<UnmixedExecution> {
        let mut source = BatchableSource::new(self.requests);
        let mut batch_results: Vec<BulkWriteBatchResult> = Vec::new();
        let mut remaining = Vec::new();

        loop {
            let stop = self.ordered && batch_results.last().map_or(false, |r| r.has_write_errors());
            if stop {
                remaining = source.get_remaining_items();
                break;
            }

            if !source.move_next()? {
                break;
            }

            let mut request = match source.take_current() {
                Some(request) => request,
                None => break,
            };

            request.validate()?;
            request.ensure_id()?;

            let request_id = conn.next_request_id();
            let message = legacy_message(request_id, &self.namespace, &request, conn.description())?;
            let index_map = IndexMap::range(0, request.original_index(), 1);

            let gle = command::send_legacy_write(conn, &self.db_name,
                                                 request.request_type().command_type(),
                                                 message, &self.write_concern)?;

            let result = match gle {
                Some(ref gle) => BulkWriteBatchResult::from_legacy(request, gle, index_map),
                None => BulkWriteBatchResult::unacknowledged(vec![request], index_map),
            };

            if let Some(ref error) = result.write_concern_error {
                tracing::warn!(code = error.code, errmsg = %error.message, "write concern error");
            }

            batch_results.push(result);
        }

        Ok(UnmixedExecution {
            batch_results: batch_results,
            remaining: remaining,
        })
    }
}

fn legacy_message(
    request_id: i32,
    namespace: &str,
    request: &WriteRequest,
    description: &ConnectionDescription,
) -> Result<Message> {
    // Inserts carry the document itself, updates and deletes the statement around it.
    let (length, max_size) = match *request {
        WriteRequest::Insert { ref document, .. } => {
            (document.byte_length()?, description.max_document_size)
        }
        WriteRequest::Update { .. } | WriteRequest::Delete { .. } => {
            (request.to_statement().byte_length()?, description.max_wire_document_size())
        }
    };

    if i64::from(length) > max_size {
        return Err(Error::ArgumentError(format!(
            "The {} at index {} is {} bytes, larger than the maximum of {}.",
            request.request_type().command_name(),
            request.original_index(),
            length,
            max_size
        )));
    }

    let message = match *request {
        WriteRequest::Insert { ref document, .. } => {
            Message::new_insert(request_id, OpInsertFlags::empty(), namespace.to_owned(),
                                vec![document.clone()])?
        }
        WriteRequest::Update { ref query, ref update, multi, upsert, .. } => {
            let flags = OpUpdateFlags::with_options(upsert.unwrap_or(false), multi.unwrap_or(false));
            Message::new_update(request_id, namespace.to_owned(), flags, query.clone(), update.clone())?
        }
        WriteRequest::Delete { ref query, limit, .. } => {
            Message::new_delete(request_id, namespace.to_owned(), OpDeleteFlags::with_limit(limit),
                                query.clone())?
        }
    };

    tracing::debug!(
        request_type = ?request.request_type(),
        original_index = request.original_index(),
        "sending legacy write"
    );

    Ok(message)
}
