//! Legacy wire protocol messages used to carry write commands and emulated writes.
pub mod flags;
pub mod header;
pub mod operations;
