//! Server limits and feature negotiation.
use bson::{self, Bson};
use crate::error::{Error, Result};
use semver::Version;

pub const DEFAULT_MAX_BSON_OBJECT_SIZE: i64 = 16 * 1024 * 1024;
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: i64 = 48000000;
pub const DEFAULT_MAX_WRITE_BATCH_SIZE: i64 = 1000;

/// Headroom the server allows on top of `maxBsonObjectSize` for command statements.
const WIRE_DOCUMENT_OVERHEAD: i64 = 16 * 1024;

/// Server features the write path changes behavior for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureId {
    /// `insert`, `update` and `delete` commands (server 2.6, wire version 2).
    WriteCommands,
    /// The `bypassDocumentValidation` write option (server 3.2, wire version 4).
    BypassDocumentValidation,
}

impl FeatureId {
    fn first_supported(self) -> (Version, i64) {
        match self {
            FeatureId::WriteCommands => (Version::new(2, 6, 0), 2),
            FeatureId::BypassDocumentValidation => (Version::new(3, 2, 0), 4),
        }
    }
}

/// Read-only description of the server at the other end of a connection, gathered from the
/// `isMaster` and `buildInfo` handshake replies.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionDescription {
    /// The version reported by `buildInfo`.
    pub server_version: Version,
    /// The maximum wire version supported by this server.
    pub max_wire_version: i64,
    /// The largest document the server will store.
    pub max_document_size: i64,
    /// The largest wire message the server will accept.
    pub max_message_size: i64,
    /// The most statements the server accepts in a single write command.
    pub max_write_batch_size: i64,
}

impl ConnectionDescription {
    /// Returns a description with the server's default limits.
    pub fn new(server_version: Version, max_wire_version: i64) -> ConnectionDescription {
        ConnectionDescription {
            server_version: server_version,
            max_wire_version: max_wire_version,
            max_document_size: DEFAULT_MAX_BSON_OBJECT_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            max_write_batch_size: DEFAULT_MAX_WRITE_BATCH_SIZE,
        }
    }

    /// Builds a description from the `isMaster` and `buildInfo` replies.
    pub fn from_replies(is_master: &bson::Document, build_info: &bson::Document) -> Result<ConnectionDescription> {
        let version = match build_info.get("version") {
            Some(&Bson::String(ref s)) => parse_version(s)?,
            _ => {
                return Err(Error::ResponseError(format!(
                    "buildInfo reply has no version string: {:?}",
                    build_info
                )))
            }
        };

        let mut description = ConnectionDescription::new(version, 0);

        if let Some(v) = int_field(is_master, "maxWireVersion") {
            description.max_wire_version = v;
        }

        if let Some(v) = int_field(is_master, "maxBsonObjectSize") {
            description.max_document_size = v;
        }

        if let Some(v) = int_field(is_master, "maxMessageSizeBytes") {
            description.max_message_size = v;
        }

        if let Some(v) = int_field(is_master, "maxWriteBatchSize") {
            description.max_write_batch_size = v;
        }

        Ok(description)
    }

    /// Whether the server supports the given feature.
    pub fn supports(&self, feature: FeatureId) -> bool {
        let (version, wire_version) = feature.first_supported();
        self.max_wire_version >= wire_version || self.server_version >= version
    }

    /// The largest single statement allowed inside a write command.
    pub fn max_wire_document_size(&self) -> i64 {
        self.max_document_size + WIRE_DOCUMENT_OVERHEAD
    }
}

/// Reads an integral field that may be encoded as any BSON numeric type.
pub fn int_field(doc: &bson::Document, key: &str) -> Option<i64> {
    match doc.get(key) {
        Some(&Bson::I32(v)) => Some(i64::from(v)),
        Some(&Bson::I64(v)) => Some(v),
        Some(&Bson::FloatingPoint(v)) => Some(v as i64),
        _ => None,
    }
}

/// Parses a server version string, ignoring any trailing build information such as `-rc1`
/// or `-pre-` that semver would otherwise treat as a pre-release.
fn parse_version(s: &str) -> Result<Version> {
    let core = s.split(|c| c == '-' || c == '+').next().unwrap_or(s);
    let mut parts: Vec<&str> = core.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }

    Ok(Version::parse(&parts[..3].join("."))?)
}
