//! Command Monitoring
//!
//! The APM module provides an interface for monitoring and responding to runtime information
//! about the write commands, legacy write messages and handshake commands sent by the bulk write
//! engine. Every monitored round trip triggers the start and completion hooks registered on the
//! connection's listener, and is traced at debug level.
mod event;
mod listener;

pub use self::event::{CommandStarted, CommandResult};
pub use self::listener::{CompletionHook, Listener, StartHook};
