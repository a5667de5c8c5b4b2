//! Encodes write commands, splitting the statement stream into size-bounded batches.
use crate::bulk::buffer::{WriteBuffer, ELEMENT_TYPE_ARRAY, ELEMENT_TYPE_DOCUMENT};
use crate::bulk::request::{RequestType, WriteRequest};
use crate::bulk::source::{BatchableSource, Overflow};
use crate::error::{Error, Result};
use crate::server::ConnectionDescription;

/// Room reserved in a wire message for the header, the command fields and the array framing.
const COMMAND_OVERHEAD: i64 = 16 * 1024;

/// The limits one batch must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// The most statements in one batch.
    pub max_batch_count: usize,
    /// The most bytes of serialized statements in one batch.
    pub max_batch_length: usize,
    /// The largest document that may be inserted.
    pub max_document_size: usize,
    /// The largest update or delete statement.
    pub max_wire_document_size: usize,
}

impl BatchLimits {
    /// Derives the limits from the server description, optionally tightened by the caller.
    pub fn new(
        description: &ConnectionDescription,
        max_batch_count: Option<usize>,
        max_batch_length: Option<usize>,
    ) -> BatchLimits {
        let server_count = description.max_write_batch_size.max(1) as usize;
        let server_length = (description.max_message_size - COMMAND_OVERHEAD).max(1) as usize;

        BatchLimits {
            max_batch_count: max_batch_count.map_or(server_count, |c| c.min(server_count)),
            max_batch_length: max_batch_length.map_or(server_length, |l| l.min(server_length)),
            max_document_size: description.max_document_size as usize,
            max_wire_document_size: description.max_wire_document_size() as usize,
        }
    }

    fn max_item_size(&self, request_type: RequestType) -> usize {
        match request_type {
            RequestType::Insert => self.max_document_size,
            RequestType::Update | RequestType::Delete => self.max_wire_document_size,
        }
    }
}

/// What one call to the serializer put into the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress<T> {
    /// The number of statements written.
    pub batch_count: usize,
    /// The bytes taken by the written statements, array element framing included.
    pub batch_length: usize,
    /// The written items, in order.
    pub batch_items: Vec<T>,
    /// Whether an item was carried over to a following batch.
    pub has_more: bool,
}

impl<T> BatchProgress<T> {
    fn new() -> BatchProgress<T> {
        BatchProgress {
            batch_count: 0,
            batch_length: 0,
            batch_items: Vec::new(),
            has_more: false,
        }
    }
}

/// Serializes write requests as the statement array of a write command.
pub struct BatchSerializer {
    limits: BatchLimits,
}

impl BatchSerializer {
    pub fn new(limits: BatchLimits) -> BatchSerializer {
        BatchSerializer { limits: limits }
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    /// Writes a complete command document: the `prefix` fields followed by one batch of
    /// statements under `items_field`.
    pub fn serialize_command<I>(
        &self,
        buffer: &mut WriteBuffer,
        prefix: &bson::Document,
        items_field: &str,
        source: &mut BatchableSource<WriteRequest, I>,
    ) -> Result<BatchProgress<WriteRequest>>
    where
        I: Iterator<Item = WriteRequest>,
    {
        let command_start = buffer.begin_document()?;
        buffer.write_elements(prefix)?;
        buffer.write_element_name(ELEMENT_TYPE_ARRAY, items_field)?;

        let progress = self.serialize_batch(buffer, source)?;

        buffer.end_document(command_start)?;
        Ok(progress)
    }

    /// Writes one batch as a BSON array whose elements are the request statements.
    ///
    /// An item that pushes the batch past either limit is taken back out of the buffer and
    /// left on the source as overflow, unless it is the only item in the batch.
    pub fn serialize_batch<I>(
        &self,
        buffer: &mut WriteBuffer,
        source: &mut BatchableSource<WriteRequest, I>,
    ) -> Result<BatchProgress<WriteRequest>>
    where
        I: Iterator<Item = WriteRequest>,
    {
        let array_start = buffer.begin_document()?;
        let mut progress = BatchProgress::new();

        if let Some(overflow) = source.start_batch() {
            let element_start = buffer.mark();
            buffer.write_element_name(ELEMENT_TYPE_DOCUMENT, "0")?;
            buffer.write_raw(&overflow.state);

            progress.batch_count = 1;
            progress.batch_length = buffer.mark() - element_start;
            progress.batch_items.push(overflow.item);
        }

        if source.can_be_split() {
            self.serialize_split(buffer, source, &mut progress)?;
        } else {
            self.serialize_whole(buffer, source, &mut progress)?;
        }

        buffer.end_document(array_start)?;
        progress.has_more = source.has_more();

        if progress.has_more {
            tracing::debug!(
                batch_count = progress.batch_count,
                batch_length = progress.batch_length,
                "batch full, carrying an item over to the next batch"
            );
        }

        Ok(progress)
    }

    fn serialize_split<I>(
        &self,
        buffer: &mut WriteBuffer,
        source: &mut BatchableSource<WriteRequest, I>,
        progress: &mut BatchProgress<WriteRequest>,
    ) -> Result<()>
    where
        I: Iterator<Item = WriteRequest>,
    {
        while source.move_next()? {
            let mut item = match source.take_current() {
                Some(item) => item,
                None => break,
            };

            let element_start = buffer.mark();
            let document_start = self.write_item(buffer, progress.batch_count, &mut item)?;

            progress.batch_count += 1;
            progress.batch_length += buffer.mark() - element_start;

            if self.exceeds_limits(progress) && progress.batch_count > 1 {
                let state = buffer.rewind(document_start);
                let element_length = state.len() + (document_start - element_start);
                buffer.rewind(element_start);

                progress.batch_count -= 1;
                progress.batch_length -= element_length;

                source.end_batch(Some(Overflow { item: item, state: state }));
                return Ok(());
            }

            progress.batch_items.push(item);
        }

        source.end_batch(None);
        Ok(())
    }

    fn serialize_whole<I>(
        &self,
        buffer: &mut WriteBuffer,
        source: &mut BatchableSource<WriteRequest, I>,
        progress: &mut BatchProgress<WriteRequest>,
    ) -> Result<()>
    where
        I: Iterator<Item = WriteRequest>,
    {
        for mut item in source.get_remaining_items() {
            let element_start = buffer.mark();
            self.write_item(buffer, progress.batch_count, &mut item)?;

            progress.batch_count += 1;
            progress.batch_length += buffer.mark() - element_start;
            progress.batch_items.push(item);
        }

        if self.exceeds_limits(progress) && progress.batch_count > 1 {
            return Err(Error::ArgumentError(format!(
                "A batch of {} statements ({} bytes) exceeds the server limits and cannot be split.",
                progress.batch_count,
                progress.batch_length
            )));
        }

        source.end_batch(None);
        Ok(())
    }

    /// Writes one array element and returns the position its document starts at.
    fn write_item(&self, buffer: &mut WriteBuffer, index: usize, item: &mut WriteRequest) -> Result<usize> {
        item.validate()?;
        item.ensure_id()?;

        buffer.write_element_name(ELEMENT_TYPE_DOCUMENT, &index.to_string())?;
        let document_start = buffer.mark();
        let length = buffer.write_document(&item.to_statement())?;

        let max_size = self.limits.max_item_size(item.request_type());
        if length > max_size {
            return Err(Error::ArgumentError(format!(
                "The {} statement at index {} is {} bytes, larger than the maximum of {}.",
                item.request_type().command_name(),
                item.original_index(),
                length,
                max_size
            )));
        }

        Ok(document_start)
    }

    fn exceeds_limits<T>(&self, progress: &BatchProgress<T>) -> bool {
        progress.batch_count > self.limits.max_batch_count ||
            progress.batch_length > self.limits.max_batch_length
    }
}
