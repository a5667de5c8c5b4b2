use std::fmt;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::error::Result;
use crate::error::Error::ResponseError;

/// The number of bytes in a serialized message header.
pub const HEADER_LENGTH: i32 = 16;

/// Represents an opcode in the MongoDB Wire Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Reply = 1,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    Delete = 2006,
}

impl OpCode {
    /// Maps a raw opcode to one of the opcodes the bulk engine sends or receives.
    pub fn from_i32(i: i32) -> Option<OpCode> {
        match i {
            1 => Some(OpCode::Reply),
            2001 => Some(OpCode::Update),
            2002 => Some(OpCode::Insert),
            2004 => Some(OpCode::Query),
            2006 => Some(OpCode::Delete),
            _ => None
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OpCode::Reply => write!(fmt, "OP_REPLY"),
            OpCode::Update => write!(fmt, "OP_UPDATE"),
            OpCode::Insert => write!(fmt, "OP_INSERT"),
            OpCode::Query => write!(fmt, "OP_QUERY"),
            OpCode::Delete => write!(fmt, "OP_DELETE"),
        }
    }
}

/// The fixed 16-byte prefix of every wire message. `response_to` is zero on requests and
/// carries the originating request id on replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub message_length: i32,
    pub request_id: i32,
    pub response_to: i32,
    pub op_code: OpCode,
}

impl Header {
    pub fn new(message_length: i32, request_id: i32, response_to: i32,
               op_code: OpCode) -> Header {
        Header { message_length: message_length, request_id: request_id,
                 response_to: response_to, op_code: op_code }
    }

    /// Constructs a new Header for a request, with `response_to` set to 0.
    pub fn new_request(message_length: i32, request_id: i32,
                       op_code: OpCode) -> Header {
        Header::new(message_length, request_id, 0, op_code)
    }

    /// Writes the serialized Header to a buffer.
    pub fn write<W: Write + ?Sized>(&self, buffer: &mut W) -> Result<()> {
        buffer.write_i32::<LittleEndian>(self.message_length)?;
        buffer.write_i32::<LittleEndian>(self.request_id)?;
        buffer.write_i32::<LittleEndian>(self.response_to)?;
        buffer.write_i32::<LittleEndian>(self.op_code as i32)?;

        Ok(())
    }

    /// Reads a header, rejecting opcodes outside the set above.
    pub fn read<R: Read + ?Sized>(buffer: &mut R) -> Result<Header> {
        let message_length = buffer.read_i32::<LittleEndian>()?;
        let request_id = buffer.read_i32::<LittleEndian>()?;
        let response_to = buffer.read_i32::<LittleEndian>()?;

        let op_code_i32 = buffer.read_i32::<LittleEndian>()?;
        let op_code = match OpCode::from_i32(op_code_i32) {
            Some(code) => code,
            _ => return Err(ResponseError(format!("Invalid header opcode from server: {}.", op_code_i32))),
        };

        Ok(Header::new(message_length, request_id, response_to, op_code))
    }
}
