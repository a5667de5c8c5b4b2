//! The bulk write pipeline.
//!
//! Requests are partitioned into single-type runs by `BulkMixedWriteOperation`, serialized into
//! size-bounded write commands by `BatchSerializer`, or sent one at a time as legacy writes by
//! `BulkWriteEmulator` on servers without write commands. Each round trip yields a
//! `BulkWriteBatchResult`, and `BulkWriteBatchResultCombiner` merges them, translating batch
//! indexes back to positions in the caller's sequence.
pub mod batch_result;
pub mod buffer;
pub mod combiner;
pub mod emulator;
pub mod index_map;
pub mod mixed;
pub mod request;
pub mod serializer;
pub mod source;
pub mod unmixed;

pub use self::batch_result::BulkWriteBatchResult;
pub use self::buffer::WriteBuffer;
pub use self::combiner::BulkWriteBatchResultCombiner;
pub use self::emulator::BulkWriteEmulator;
pub use self::index_map::{IndexMap, IndexRange};
pub use self::mixed::BulkMixedWriteOperation;
pub use self::request::{RequestType, WriteRequest};
pub use self::serializer::{BatchLimits, BatchProgress, BatchSerializer};
pub use self::source::{BatchableSource, Overflow};
pub use self::unmixed::{BulkUnmixedWriteOperation, UnmixedExecution};
