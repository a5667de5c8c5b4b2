//! Write concern configuration shared by every write path.
use bson::{self, Bson};
use serde_derive::{Deserialize, Serialize};

/// Describes the level of acknowledgement requested from the server for write operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConcern {
    pub w: i32,          // Write replication
    #[serde(rename = "wtimeout")]
    pub w_timeout: i32,  // Used in conjunction with 'w'. Propagation timeout in ms.
    pub j: bool,         // If true, will block until write operations have been committed to journal.
    pub fsync: bool,     // If true and server is not journaling, blocks until server has synced all data files to disk.
}

impl Default for WriteConcern {
    fn default() -> WriteConcern {
        WriteConcern::new()
    }
}

impl WriteConcern {
    /// Returns the server-default write concern, `{ w: 1 }`.
    pub fn new() -> WriteConcern {
        WriteConcern {
            w: 1,
            w_timeout: 0,
            j: false,
            fsync: false,
        }
    }

    /// Returns a fire-and-forget write concern, `{ w: 0 }`.
    pub fn unacknowledged() -> WriteConcern {
        WriteConcern {
            w: 0,
            ..WriteConcern::new()
        }
    }

    /// Whether the server will reply to writes issued with this write concern.
    pub fn is_acknowledged(&self) -> bool {
        self.w != 0 || self.j || self.fsync
    }

    /// Whether this is the plain `{ w: 1 }` default, in which case it need not be sent.
    pub fn is_server_default(&self) -> bool {
        *self == WriteConcern::new()
    }

    pub fn to_bson(&self) -> bson::Document {
        let mut bson = bson::Document::new();
        bson.insert("w".to_owned(), Bson::I32(self.w));
        bson.insert("wtimeout".to_owned(), Bson::I32(self.w_timeout));
        bson.insert("j".to_owned(), Bson::Boolean(self.j));
        if self.fsync {
            bson.insert("fsync".to_owned(), Bson::Boolean(true));
        }
        bson
    }
}
