//! The outcome of a single round trip of a bulk write.
use bson::{self, Bson};
use crate::bulk::index_map::IndexMap;
use crate::bulk::request::{RequestType, WriteRequest};
use crate::coll::error::{BulkWriteError, WriteConcernError};
use crate::coll::results::BulkWriteUpsert;
use crate::error::{Error, ErrorCode, Result};
use crate::server::int_field;

/// Counts, upserts and errors reported for one homogeneous batch.
///
/// Upsert and write error indexes are batch-local; `index_map` translates them.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteBatchResult {
    pub batch_count: usize,
    pub acknowledged: bool,
    pub processed_requests: Vec<WriteRequest>,
    pub unprocessed_requests: Vec<WriteRequest>,
    pub inserted_count: i64,
    pub matched_count: i64,
    pub modified_count: Option<i64>,
    pub deleted_count: i64,
    pub upserts: Vec<BulkWriteUpsert>,
    pub write_errors: Vec<BulkWriteError>,
    pub write_concern_error: Option<WriteConcernError>,
    pub index_map: IndexMap,
}

impl BulkWriteBatchResult {
    fn empty(requests: Vec<WriteRequest>, index_map: IndexMap) -> BulkWriteBatchResult {
        BulkWriteBatchResult {
            batch_count: requests.len(),
            acknowledged: true,
            processed_requests: requests,
            unprocessed_requests: Vec::new(),
            inserted_count: 0,
            matched_count: 0,
            modified_count: Some(0),
            deleted_count: 0,
            upserts: Vec::new(),
            write_errors: Vec::new(),
            write_concern_error: None,
            index_map: index_map,
        }
    }

    /// The result of a batch sent with an unacknowledged write concern. Every request counts
    /// as processed.
    pub fn unacknowledged(requests: Vec<WriteRequest>, index_map: IndexMap) -> BulkWriteBatchResult {
        BulkWriteBatchResult {
            acknowledged: false,
            modified_count: None,
            ..BulkWriteBatchResult::empty(requests, index_map)
        }
    }

    /// Builds the result of a write command from its reply.
    ///
    /// For ordered batches the server stops at the first write error, so only the prefix up to
    /// the last reported error counts as processed.
    pub fn from_command_reply(
        reply: &bson::Document,
        requests: Vec<WriteRequest>,
        ordered: bool,
        index_map: IndexMap,
    ) -> Result<BulkWriteBatchResult> {
        let request_type = requests.first().map(|r| r.request_type());
        let n = int_field(reply, "n").unwrap_or(0);

        let upserts = parse_upserts(reply)?;
        let mut write_errors = parse_write_errors(reply)?;
        let write_concern_error = match reply.get("writeConcernError") {
            Some(&Bson::Document(ref error)) => Some(WriteConcernError::parse(error)?),
            _ => None,
        };

        for error in &mut write_errors {
            error.request = requests.get(error.index).cloned();
        }

        let mut result = BulkWriteBatchResult::empty(requests, index_map);

        match request_type {
            Some(RequestType::Insert) => result.inserted_count = n,
            Some(RequestType::Delete) => result.deleted_count = n,
            Some(RequestType::Update) => {
                result.matched_count = n - upserts.len() as i64;
                result.modified_count = int_field(reply, "nModified");
            }
            None => (),
        }

        if ordered {
            if let Some(last_error) = write_errors.iter().map(|e| e.index).max() {
                let processed = (last_error + 1).min(result.processed_requests.len());
                result.unprocessed_requests = result.processed_requests.split_off(processed);
            }
        }

        result.upserts = upserts;
        result.write_errors = write_errors;
        result.write_concern_error = write_concern_error;
        Ok(result)
    }

    /// Builds the result of one emulated write from its `getLastError` reply.
    pub fn from_legacy(
        request: WriteRequest,
        gle: &bson::Document,
        index_map: IndexMap,
    ) -> BulkWriteBatchResult {
        let n = int_field(gle, "n").unwrap_or(0);

        let mut write_error = None;
        let mut write_concern_error = None;

        if let Some(message) = legacy_error_message(gle) {
            let code = int_field(gle, "code");

            if gle.contains_key("wtimeout") || gle.contains_key("wnote") || gle.contains_key("jnote") {
                let code = code.unwrap_or(ErrorCode::WriteConcernFailed.code() as i64);
                write_concern_error = Some(WriteConcernError::new(code as i32, message, Some(gle.clone())));
            } else {
                let code = code.unwrap_or(ErrorCode::UnknownError.code() as i64);
                write_error = Some(BulkWriteError::new(0, code as i32, message, Some(request.clone())));
            }
        }

        let upserted_id = match gle.get("upserted") {
            Some(id) => Some(id.clone()),
            None => infer_upserted_id(&request, gle, n),
        };

        let request_type = request.request_type();
        let mut result = BulkWriteBatchResult::empty(vec![request], index_map);

        match request_type {
            RequestType::Insert => {
                result.inserted_count = if write_error.is_none() { 1 } else { 0 };
            }
            RequestType::Delete => result.deleted_count = n,
            RequestType::Update => {
                if let Some(id) = upserted_id {
                    result.upserts.push(BulkWriteUpsert { index: 0, id: id });
                }
                result.matched_count = (n - result.upserts.len() as i64).max(0);
                result.modified_count = None;
            }
        }

        result.write_errors.extend(write_error);
        result.write_concern_error = write_concern_error;
        result
    }

    pub fn has_write_errors(&self) -> bool {
        !self.write_errors.is_empty()
    }

    pub fn has_write_concern_error(&self) -> bool {
        self.write_concern_error.is_some()
    }
}

/// The failure a `getLastError` reply describes: its `err` string, or for a reply with
/// `ok: 0` its `errmsg`.
fn legacy_error_message(gle: &bson::Document) -> Option<String> {
    if let Some(&Bson::String(ref err)) = gle.get("err") {
        return Some(err.to_owned());
    }

    if int_field(gle, "ok") == Some(1) {
        return None;
    }

    Some(match gle.get("errmsg") {
        Some(&Bson::String(ref errmsg)) => errmsg.to_owned(),
        _ => String::from("getLastError failed"),
    })
}

/// Old servers do not report the id of an upsert whose id came from the client; recover it from
/// the update or the query.
fn infer_upserted_id(request: &WriteRequest, gle: &bson::Document, n: i64) -> Option<Bson> {
    let updated_existing = match gle.get("updatedExisting") {
        Some(&Bson::Boolean(b)) => b,
        _ => false,
    };

    match *request {
        WriteRequest::Update { ref query, ref update, .. }
            if request.is_upsert() && n == 1 && !updated_existing =>
        {
            update.get("_id").or_else(|| query.get("_id")).cloned()
        }
        _ => None,
    }
}

fn parse_upserts(reply: &bson::Document) -> Result<Vec<BulkWriteUpsert>> {
    let upserted = match reply.get("upserted") {
        Some(&Bson::Array(ref upserted)) => upserted,
        _ => return Ok(Vec::new()),
    };

    let mut upserts = Vec::with_capacity(upserted.len());
    for entry in upserted {
        let entry = match *entry {
            Bson::Document(ref doc) => doc,
            _ => return Err(Error::ResponseError(format!("Upserted entry is not a document: {:?}", entry))),
        };

        match (int_field(entry, "index"), entry.get("_id")) {
            (Some(index), Some(id)) if index >= 0 => {
                upserts.push(BulkWriteUpsert { index: index as usize, id: id.clone() })
            }
            _ => return Err(Error::ResponseError(format!("Upserted entry is invalid: {:?}", entry))),
        }
    }
    Ok(upserts)
}

fn parse_write_errors(reply: &bson::Document) -> Result<Vec<BulkWriteError>> {
    let errors = match reply.get("writeErrors") {
        Some(&Bson::Array(ref errors)) => errors,
        _ => return Ok(Vec::new()),
    };

    if errors.is_empty() {
        return Err(Error::ResponseError(String::from(
            "Server indicates a write error, but none were found.",
        )));
    }

    let mut vec = Vec::with_capacity(errors.len());
    for err in errors {
        if let Bson::Document(ref doc) = *err {
            vec.push(BulkWriteError::parse(doc)?);
        } else {
            return Err(Error::ResponseError(
                String::from("WriteError provided was not a bson document."),
            ));
        }
    }
    Ok(vec)
}
