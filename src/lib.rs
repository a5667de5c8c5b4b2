//! Bulk write engine for a native MongoDB driver.
//!
//! The engine accepts a mixed sequence of inserts, updates and deletes and submits it to the
//! server in as few round trips as the server limits allow, using write commands where the
//! server supports them and one legacy write message plus `getLastError` per request where it
//! does not. Per-request outcomes are merged back into a single result whose indexes refer to
//! the caller's original sequence.
//!
//! ```no_run
//! # #[macro_use] extern crate bson;
//! # extern crate mongo_bulk;
//! use mongo_bulk::coll::Collection;
//! use mongo_bulk::coll::options::{BulkWriteOptions, WriteModel};
//! use mongo_bulk::connection::StreamConnection;
//!
//! # fn main() -> mongo_bulk::Result<()> {
//! let mut conn = StreamConnection::connect("localhost", 27017)?;
//! let coll = Collection::new("test", "people", None);
//!
//! let models = vec![
//!     WriteModel::InsertOne { document: doc! { "_id": 1, "name": "Ada" } },
//!     WriteModel::UpdateOne {
//!         filter: doc! { "_id": 1 },
//!         update: doc! { "$set": { "name": "Ada Lovelace" } },
//!         upsert: None,
//!     },
//!     WriteModel::DeleteMany { filter: doc! { "retired": true } },
//! ];
//!
//! let result = coll.bulk_write(&mut conn, models, BulkWriteOptions::new())?;
//! assert_eq!(result.inserted_count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Command Monitoring
//!
//! Every write command, emulated write and handshake command emits start and completion events
//! to the connection's `apm::Listener`, and is traced with the `tracing` crate.
pub mod apm;
pub mod bulk;
pub mod coll;
pub mod command;
pub mod command_type;
pub mod common;
pub mod connection;
pub mod error;
pub mod server;
pub mod wire_protocol;

pub use crate::error::{Error, ErrorCode, Result};
