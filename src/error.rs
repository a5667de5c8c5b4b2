//! Library-level errors.
use bson::{self, oid};
use crate::coll::error::{BulkWriteException, WriteException};
use semver::SemVerError;
use std::{error, fmt, io, sync};

/// A type for results generated by the bulk write engine, where the error type is the
/// library's error enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Well-known server error codes used by the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownError = 8,
    CommandNotFound = 59,
    WriteConcernFailed = 64,
    DuplicateKey = 11000,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The error type for bulk write operations.
#[derive(Debug)]
pub enum Error {
    /// A single-item write failed on the server.
    WriteError(WriteException),
    /// One or more items of a bulk write failed, or the write concern could not be satisfied.
    BulkWriteError(BulkWriteException),
    /// A BSON struct could not be encoded.
    EncoderError(bson::EncoderError),
    /// A BSON struct could not be decoded.
    DecoderError(bson::DecoderError),
    /// An ObjectId could not be generated.
    OIDError(oid::Error),
    /// A server version string could not be parsed.
    VersionError(SemVerError),
    /// A standard IO error occurred.
    IoError(io::Error),
    /// A lock guarding shared monitoring state was poisoned.
    PoisonLockError,
    /// The server reply could not be understood.
    ResponseError(String),
    /// A request was rejected on the client before being sent.
    ArgumentError(String),
    /// The server rejected a command, or the operation was used incorrectly.
    OperationError(String),
    /// A command monitoring hook could not be run.
    EventListenerError(Option<Box<Error>>),
    /// A generic error.
    DefaultError(String),
}

impl<'a> From<&'a str> for Error {
    fn from(s: &str) -> Error {
        Error::DefaultError(s.to_owned())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::DefaultError(s)
    }
}

impl From<WriteException> for Error {
    fn from(err: WriteException) -> Error {
        Error::WriteError(err)
    }
}

impl From<BulkWriteException> for Error {
    fn from(err: BulkWriteException) -> Error {
        Error::BulkWriteError(err)
    }
}

impl From<bson::EncoderError> for Error {
    fn from(err: bson::EncoderError) -> Error {
        Error::EncoderError(err)
    }
}

impl From<bson::DecoderError> for Error {
    fn from(err: bson::DecoderError) -> Error {
        Error::DecoderError(err)
    }
}

impl From<oid::Error> for Error {
    fn from(err: oid::Error) -> Error {
        Error::OIDError(err)
    }
}

impl From<SemVerError> for Error {
    fn from(err: SemVerError) -> Error {
        Error::VersionError(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Error {
        Error::PoisonLockError
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::WriteError(ref inner) => write!(fmt, "{}", inner),
            Error::BulkWriteError(ref inner) => write!(fmt, "{}", inner),
            Error::EncoderError(ref inner) => write!(fmt, "{}", inner),
            Error::DecoderError(ref inner) => write!(fmt, "{}", inner),
            Error::OIDError(ref inner) => write!(fmt, "{}", inner),
            Error::VersionError(ref inner) => write!(fmt, "{}", inner),
            Error::IoError(ref inner) => write!(fmt, "{}", inner),
            Error::PoisonLockError => fmt.write_str("Monitoring lock poisoned while running hooks."),
            Error::ResponseError(ref inner) |
            Error::ArgumentError(ref inner) |
            Error::OperationError(ref inner) |
            Error::DefaultError(ref inner) => fmt.write_str(inner),
            Error::EventListenerError(ref inner) => {
                fmt.write_str("EventListenerError")?;
                match *inner {
                    Some(ref err) => write!(fmt, ": {}", err),
                    None => Ok(()),
                }
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::WriteError(ref inner) => Some(inner),
            Error::BulkWriteError(ref inner) => Some(inner),
            Error::EncoderError(ref inner) => Some(inner),
            Error::DecoderError(ref inner) => Some(inner),
            Error::OIDError(ref inner) => Some(inner),
            Error::VersionError(ref inner) => Some(inner),
            Error::IoError(ref inner) => Some(inner),
            Error::EventListenerError(Some(ref inner)) => Some(inner.as_ref()),
            _ => None,
        }
    }
}
