//! Write errors for collection-level operations.
use bson::{self, Bson};
use crate::bulk::WriteRequest;
use crate::coll::results::BulkWriteResult;
use crate::error::{Error, ErrorCode, Result};
use crate::server::int_field;
use std::{error, fmt};

/// The error type for single-item write operations.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteException {
    pub write_concern_error: Option<WriteConcernError>,
    pub write_error: Option<WriteError>,
    pub message: String,
}

/// The error struct for a write-concern related error.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteConcernError {
    pub code: i32,
    pub message: String,
    pub details: Option<bson::Document>,
}

/// The error struct for a write-related error.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriteError {
    pub code: i32,
    pub message: String,
}

/// The error struct for bulk write operations in which some requests failed.
///
/// The partial result covers every request the server processed. Write errors are sorted by
/// the index of the failed request in the caller's sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteException {
    pub result: BulkWriteResult,
    pub write_errors: Vec<BulkWriteError>,
    pub write_concern_error: Option<WriteConcernError>,
    pub unprocessed_requests: Vec<WriteRequest>,
    pub message: String,
}

/// The error struct for a single bulk-write step, indicating the request
/// and its index in the original bulk-write request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteError {
    pub index: usize,
    pub code: i32,
    pub message: String,
    pub details: Option<bson::Document>,
    pub request: Option<WriteRequest>,
}

impl error::Error for WriteException {}

impl error::Error for BulkWriteException {}

impl fmt::Display for WriteException {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("WriteException:")?;

        if let Some(ref wc_err) = self.write_concern_error {
            write!(fmt, " {}", wc_err)?;
        }

        if let Some(ref w_err) = self.write_error {
            write!(fmt, " {}", w_err)?;
        }

        Ok(())
    }
}

impl fmt::Display for BulkWriteException {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        writeln!(fmt, "BulkWriteException:")?;
        writeln!(
            fmt,
            "Processed {} of {} requests.",
            self.result.processed_requests.len(),
            self.result.request_count
        )?;

        writeln!(fmt, "Unprocessed Requests:")?;
        for v in &self.unprocessed_requests {
            writeln!(fmt, "{:?}", v)?;
        }

        if let Some(ref error) = self.write_concern_error {
            writeln!(fmt, "{}", error)?;
        }

        for v in &self.write_errors {
            writeln!(fmt, "{}", v)?;
        }

        Ok(())
    }
}

impl fmt::Display for WriteConcernError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "WriteConcernError (code {}): {}", self.code, self.message)
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "WriteError (code {}): {}", self.code, self.message)
    }
}

impl fmt::Display for BulkWriteError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "BulkWriteError at index {} (code {}): {}. ",
            self.index,
            self.code,
            self.message
        )?;

        match self.request {
            Some(ref request) => write!(fmt, "Failed to execute request {:?}.", request),
            None => fmt.write_str("No additional error information was received.")
        }
    }
}

impl WriteException {
    /// Returns a new WriteException containing the given errors.
    pub fn new(wc_err: Option<WriteConcernError>, w_err: Option<WriteError>) -> WriteException {
        let mut messages = Vec::new();

        if let Some(ref error) = wc_err {
            messages.push(error.to_string());
        }

        if let Some(ref error) = w_err {
            messages.push(error.to_string());
        }

        WriteException {
            write_concern_error: wc_err,
            write_error: w_err,
            message: messages.join(" "),
        }
    }

    /// Downgrades a BulkWriteException into a WriteException, retrieving the
    /// last write error to emulate the behavior of continue_on_error.
    pub fn with_bulk_exception(bulk_exception: BulkWriteException) -> WriteException {
        let mut write_errors = bulk_exception.write_errors;
        let write_error = write_errors.pop().map(|e| WriteError::new(e.code, e.message));

        WriteException::new(bulk_exception.write_concern_error, write_error)
    }

    /// Converts a bulk write failure into a single-item failure, leaving any other error as is.
    pub fn downgrade(error: Error) -> Error {
        match error {
            Error::BulkWriteError(bulk_exception) => {
                Error::WriteError(WriteException::with_bulk_exception(bulk_exception))
            }
            other => other,
        }
    }
}

impl WriteConcernError {
    /// Returns a new WriteConcernError containing the provided error information.
    pub fn new<T: ToString>(code: i32, message: T, details: Option<bson::Document>) -> WriteConcernError {
        WriteConcernError {
            code: code,
            message: message.to_string(),
            details: details,
        }
    }

    /// Parses the `writeConcernError` document of a write command reply.
    pub fn parse(error: &bson::Document) -> Result<WriteConcernError> {
        let code = int_field(error, "code").unwrap_or(ErrorCode::WriteConcernFailed.code() as i64);

        match error.get("errmsg") {
            Some(&Bson::String(ref message)) => {
                Ok(WriteConcernError::new(code as i32, message, details(error)))
            }
            _ => Err(Error::ResponseError(format!(
                "WriteConcernError document is invalid: {:?}",
                error
            )))
        }
    }
}

impl WriteError {
    /// Returns a new WriteError containing the provided error information.
    pub fn new<T: ToString>(code: i32, message: T) -> WriteError {
        WriteError {
            code: code,
            message: message.to_string(),
        }
    }
}

impl BulkWriteError {
    /// Returns a new BulkWriteError containing the provided error information.
    pub fn new<T: ToString>(
        index: usize,
        code: i32,
        message: T,
        request: Option<WriteRequest>,
    ) -> BulkWriteError {
        BulkWriteError {
            index: index,
            code: code,
            message: message.to_string(),
            details: None,
            request: request,
        }
    }

    /// Parses one entry of the `writeErrors` array of a write command reply.
    pub fn parse(error: &bson::Document) -> Result<BulkWriteError> {
        match (int_field(error, "index"), int_field(error, "code"), error.get("errmsg")) {
            (Some(index), Some(code), Some(&Bson::String(ref message))) if index >= 0 => {
                let mut parsed = BulkWriteError::new(index as usize, code as i32, message, None);
                parsed.details = details(error);
                Ok(parsed)
            }
            _ => Err(Error::ResponseError(
                format!("WriteError document is invalid: {:?}", error),
            ))
        }
    }
}

impl BulkWriteException {
    /// Returns a new BulkWriteException wrapping the partial result.
    pub fn new(
        result: BulkWriteResult,
        write_errors: Vec<BulkWriteError>,
        write_concern_error: Option<WriteConcernError>,
        unprocessed_requests: Vec<WriteRequest>,
    ) -> BulkWriteException {
        let mut messages: Vec<String> = write_concern_error.iter().map(|e| e.to_string()).collect();
        messages.extend(write_errors.iter().map(|e| e.to_string()));

        BulkWriteException {
            result: result,
            write_errors: write_errors,
            write_concern_error: write_concern_error,
            unprocessed_requests: unprocessed_requests,
            message: messages.join("\n"),
        }
    }

    /// The requests the server processed, failed ones included.
    pub fn processed_requests(&self) -> &[WriteRequest] {
        &self.result.processed_requests
    }
}

fn details(error: &bson::Document) -> Option<bson::Document> {
    match error.get("errInfo") {
        Some(&Bson::Document(ref info)) => Some(info.clone()),
        _ => None,
    }
}
