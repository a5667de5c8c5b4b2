//! An in-memory BSON output buffer supporting positional rewind.
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use crate::error::{Error, Result};

use std::io::{self, Write};

pub const ELEMENT_TYPE_DOCUMENT: u8 = 0x03;
pub const ELEMENT_TYPE_ARRAY: u8 = 0x04;

/// A growable byte buffer that write commands are assembled in.
///
/// Documents are framed in place: `begin_document` reserves the length prefix and
/// `end_document` patches it, so elements can be streamed in without building an
/// intermediate `bson::Document`. `mark` and `rewind` let the serializer take back the
/// element it wrote last.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    bytes: Vec<u8>,
}

impl WriteBuffer {
    pub fn new() -> WriteBuffer {
        WriteBuffer { bytes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Records the current position.
    pub fn mark(&self) -> usize {
        self.bytes.len()
    }

    /// Truncates the buffer back to `mark`, returning the bytes written since.
    pub fn rewind(&mut self, mark: usize) -> Vec<u8> {
        if mark >= self.bytes.len() {
            return Vec::new();
        }
        self.bytes.split_off(mark)
    }

    /// Reserves the length prefix of a document and returns its position.
    pub fn begin_document(&mut self) -> Result<usize> {
        let start = self.mark();
        self.bytes.write_i32::<LittleEndian>(0)?;
        Ok(start)
    }

    /// Terminates the document started at `start` and patches its length prefix.
    pub fn end_document(&mut self, start: usize) -> Result<()> {
        self.bytes.write_u8(0)?;

        let length = self.bytes.len() - start;
        if length > i32::max_value() as usize {
            return Err(Error::ArgumentError(format!("Document of {} bytes is too large.", length)));
        }

        LittleEndian::write_i32(&mut self.bytes[start..start + 4], length as i32);
        Ok(())
    }

    /// Writes an element's type byte and name.
    pub fn write_element_name(&mut self, element_type: u8, name: &str) -> Result<()> {
        if name.as_bytes().contains(&0) {
            return Err(Error::ArgumentError(format!("Element name {:?} contains a null byte.", name)));
        }

        self.bytes.write_u8(element_type)?;
        self.bytes.write_all(name.as_bytes())?;
        self.bytes.write_u8(0)?;
        Ok(())
    }

    /// Writes every element of `document` into the document currently being framed.
    pub fn write_elements(&mut self, document: &bson::Document) -> Result<()> {
        let mut encoded = Vec::new();
        bson::encode_document(&mut encoded, document)?;

        // Strip the length prefix and the terminating null byte.
        self.bytes.extend_from_slice(&encoded[4..encoded.len() - 1]);
        Ok(())
    }

    /// Writes a complete document, returning its encoded length.
    pub fn write_document(&mut self, document: &bson::Document) -> Result<usize> {
        let start = self.mark();
        bson::encode_document(&mut self.bytes, document)?;
        Ok(self.bytes.len() - start)
    }

    /// Writes bytes that are already valid BSON at this position.
    pub fn write_raw(&mut self, raw: &[u8]) {
        self.bytes.extend_from_slice(raw);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hands the assembled bytes over, leaving the buffer empty for the next batch.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        let capacity = self.bytes.capacity();
        std::mem::replace(&mut self.bytes, Vec::with_capacity(capacity))
    }
}

impl Write for WriteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
