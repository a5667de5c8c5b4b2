//! Wire protocol operational client-server communication logic.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::error::Error::{ArgumentError, ResponseError};
use crate::error::Result;
use crate::wire_protocol::header::{Header, OpCode, HEADER_LENGTH};
use crate::wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpQueryFlags, OpReplyFlags,
                                  OpUpdateFlags};

use std::io::{Cursor, Read, Write};
use std::mem;

pub trait ByteLength {
    /// Calculates the number of bytes in the serialized version of the struct.
    fn byte_length(&self) -> Result<i32>;
}

impl ByteLength for bson::Document {
    /// Gets the length of a BSON document.
    ///
    /// # Return value
    ///
    /// Returns the number of bytes in the serialized BSON document, or an
    /// Error if the document couldn't be serialized.
    fn byte_length(&self) -> Result<i32> {
        let mut temp_buffer = vec![];

        bson::encode_document(&mut temp_buffer, self)?;
        Ok(temp_buffer.len() as i32)
    }
}

/// Represents a message in the MongoDB Wire Protocol.
#[derive(Debug, Clone)]
pub enum Message {
    OpReply {
        /// The message header.
        header: Header,
        /// A Bit vector of reply options.
        flags: OpReplyFlags,
        /// Uniquely identifies the cursor being returned.
        cursor_id: i64,
        /// The starting position for the cursor.
        starting_from: i32,
        /// The total number of documents being returned.
        number_returned: i32,
        /// The documents being returned.
        documents: Vec<bson::Document>,
    },
    OpUpdate {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The full qualified name of the collection, beginning with the
        /// database name and a dot separator.
        namespace: String,
        /// A bit vector of update options.
        flags: OpUpdateFlags,
        /// Identifies the document(s) to be updated.
        selector: bson::Document,
        /// Instruction document for how to update the document(s).
        update: bson::Document,
    },
    OpInsert {
        /// The message header.
        header: Header,
        /// A bit vector of insert options.
        flags: OpInsertFlags,
        /// The full qualified name of the collection, beginning with the
        /// database name and a dot separator.
        namespace: String,
        /// The documents to be inserted.
        documents: Vec<bson::Document>,
    },
    OpQuery {
        /// The message header.
        header: Header,
        /// A bit vector of query options.
        flags: OpQueryFlags,
        /// The full qualified name of the collection, beginning with the
        /// database name and a dot separator.
        namespace: String,
        /// The number of initial documents to skip over in the query results.
        number_to_skip: i32,
        /// The total number of documents that should be returned by the query.
        number_to_return: i32,
        /// The already-encoded query document. Write commands are assembled
        /// directly into BSON by the batch serializer.
        query: Vec<u8>,
    },
    OpDelete {
        /// The message header.
        header: Header,
        // The wire protocol specifies that a 32-bit 0 field goes here
        /// The full qualified name of the collection, beginning with the
        /// database name and a dot separator.
        namespace: String,
        /// A bit vector of delete options.
        flags: OpDeleteFlags,
        /// Identifies the document(s) to be removed.
        selector: bson::Document,
    },
}

impl Message {
    /// Constructs a new message for a reply.
    pub fn new_reply(
        header: Header,
        flags: i32,
        cursor_id: i64,
        starting_from: i32,
        number_returned: i32,
        documents: Vec<bson::Document>,
    ) -> Message {
        Message::OpReply {
            header: header,
            flags: OpReplyFlags::from_bits_truncate(flags),
            cursor_id: cursor_id,
            starting_from: starting_from,
            number_returned: number_returned,
            documents: documents,
        }
    }

    /// Constructs a single-document reply to the request with the given id.
    pub fn new_command_reply(request_id: i32, response_to: i32, reply: bson::Document) -> Result<Message> {
        // flags, starting_from and number_returned, plus the cursor id.
        let fixed_length = 3 * mem::size_of::<i32>() as i32 + mem::size_of::<i64>() as i32;
        let total_length = HEADER_LENGTH + fixed_length + reply.byte_length()?;
        let header = Header::new(total_length, request_id, response_to, OpCode::Reply);

        Ok(Message::new_reply(header, 0, 0, 0, 1, vec![reply]))
    }

    /// Constructs a new message for an update.
    pub fn new_update(
        request_id: i32,
        namespace: String,
        flags: OpUpdateFlags,
        selector: bson::Document,
        update: bson::Document,
    ) -> Result<Message> {
        // Add an extra byte after the string for null-termination.
        let string_length = namespace.len() as i32 + 1;

        // There are two i32 fields -- `flags` is represented in the struct as
        // a bit vector, and the wire protocol-specified ZERO field.
        let i32_length = mem::size_of::<i32>() as i32 * 2;

        let selector_length = selector.byte_length()?;
        let update_length = update.byte_length()?;

        let total_length = HEADER_LENGTH + string_length + i32_length + selector_length +
            update_length;

        let header = Header::new_request(total_length, request_id, OpCode::Update);

        Ok(Message::OpUpdate {
            header: header,
            namespace: namespace,
            flags: flags,
            selector: selector,
            update: update,
        })
    }

    /// Constructs a new message request for an insertion.
    pub fn new_insert(
        request_id: i32,
        flags: OpInsertFlags,
        namespace: String,
        documents: Vec<bson::Document>,
    ) -> Result<Message> {
        let flags_length = mem::size_of::<i32>() as i32;

        // Add an extra byte after the string for null-termination.
        let string_length = namespace.len() as i32 + 1;

        let mut total_length = HEADER_LENGTH + flags_length + string_length;

        for doc in &documents {
            total_length += doc.byte_length()?;
        }

        let header = Header::new_request(total_length, request_id, OpCode::Insert);

        Ok(Message::OpInsert {
            header: header,
            flags: flags,
            namespace: namespace,
            documents: documents,
        })
    }

    /// Constructs a new message request for a query.
    pub fn new_query(
        request_id: i32,
        flags: OpQueryFlags,
        namespace: String,
        number_to_skip: i32,
        number_to_return: i32,
        query: &bson::Document,
    ) -> Result<Message> {
        let mut raw = vec![];
        bson::encode_document(&mut raw, query)?;

        Ok(Message::new_raw_query(request_id, flags, namespace, number_to_skip, number_to_return, raw))
    }

    /// Constructs a new query message around a document that has already been encoded.
    pub fn new_raw_query(
        request_id: i32,
        flags: OpQueryFlags,
        namespace: String,
        number_to_skip: i32,
        number_to_return: i32,
        query: Vec<u8>,
    ) -> Message {
        // There are three i32 fields in the an OpQuery (since OpQueryFlags is
        // represented as an 32-bit vector in the wire protocol).
        let i32_length = 3 * mem::size_of::<i32>() as i32;

        // Add an extra byte after the string for null-termination.
        let string_length = namespace.len() as i32 + 1;

        let total_length = HEADER_LENGTH + i32_length + string_length + query.len() as i32;

        let header = Header::new_request(total_length, request_id, OpCode::Query);

        Message::OpQuery {
            header: header,
            flags: flags,
            namespace: namespace,
            number_to_skip: number_to_skip,
            number_to_return: number_to_return,
            query: query,
        }
    }

    /// Constructs a new message request for a removal.
    pub fn new_delete(
        request_id: i32,
        namespace: String,
        flags: OpDeleteFlags,
        selector: bson::Document,
    ) -> Result<Message> {
        // Add an extra byte after the string for null-termination.
        let string_length = namespace.len() as i32 + 1;

        // The ZERO field and the flags.
        let i32_length = mem::size_of::<i32>() as i32 * 2;

        let total_length = HEADER_LENGTH + string_length + i32_length + selector.byte_length()?;

        let header = Header::new_request(total_length, request_id, OpCode::Delete);

        Ok(Message::OpDelete {
            header: header,
            namespace: namespace,
            flags: flags,
            selector: selector,
        })
    }

    /// Returns the header of the message.
    pub fn header(&self) -> &Header {
        match *self {
            Message::OpReply { ref header, .. } |
            Message::OpUpdate { ref header, .. } |
            Message::OpInsert { ref header, .. } |
            Message::OpQuery { ref header, .. } |
            Message::OpDelete { ref header, .. } => header,
        }
    }

    /// Decodes the query document of an OP_QUERY message.
    pub fn query_document(&self) -> Result<bson::Document> {
        match *self {
            Message::OpQuery { ref query, .. } => {
                Ok(bson::decode_document(&mut Cursor::new(&query[..]))?)
            }
            _ => Err(ArgumentError(format!("{} carries no query document.", self.header().op_code))),
        }
    }

    /// Returns the first document of an OP_REPLY message.
    pub fn reply_document(self) -> Result<bson::Document> {
        match self {
            Message::OpReply { documents, .. } => {
                documents.into_iter().next().ok_or_else(|| {
                    ResponseError(String::from("Server reply did not contain a document."))
                })
            }
            other => Err(ResponseError(format!(
                "Expected to receive OP_REPLY but instead found {}.",
                other.header().op_code
            ))),
        }
    }

    /// Writes a serialized BSON document to a given buffer.
    fn write_bson_document<W: Write>(buffer: &mut W, bson: &bson::Document) -> Result<()> {
        let mut temp_buffer = vec![];

        bson::encode_document(&mut temp_buffer, bson)?;
        buffer.write_all(&temp_buffer)?;
        Ok(())
    }

    /// Writes a namespace as a null-terminated string.
    fn write_cstring<W: Write>(buffer: &mut W, namespace: &str) -> Result<()> {
        buffer.write_all(namespace.as_bytes())?;

        // Writes the null terminator for the collection name string.
        buffer.write_u8(0)?;
        Ok(())
    }

    /// Writes a serialized update message to a given buffer.
    ///
    /// # Arguments
    ///
    /// `buffer` - The buffer to write to.
    /// `header` - The header for the given message.
    /// `namespace` - The full qualified name of the collection, beginning with
    ///               the database name and a dot.
    /// `flags` - Bit vector of update options.
    /// `selector` - Identifies the document(s) to be updated.
    /// `update` - Instructs how to update the document(s).
    ///
    /// # Return value
    ///
    /// Returns nothing on success, or an Error on failure.
    fn write_update<W: Write>(
        buffer: &mut W,
        header: &Header,
        namespace: &str,
        flags: &OpUpdateFlags,
        selector: &bson::Document,
        update: &bson::Document,
    ) -> Result<()> {
        header.write(buffer)?;

        // Write ZERO field
        buffer.write_i32::<LittleEndian>(0)?;
        Message::write_cstring(buffer, namespace)?;
        buffer.write_i32::<LittleEndian>(flags.bits())?;

        Message::write_bson_document(buffer, selector)?;
        Message::write_bson_document(buffer, update)?;

        Ok(())
    }

    fn write_insert<W: Write>(
        buffer: &mut W,
        header: &Header,
        flags: &OpInsertFlags,
        namespace: &str,
        documents: &[bson::Document],
    ) -> Result<()> {
        header.write(buffer)?;
        buffer.write_i32::<LittleEndian>(flags.bits())?;
        Message::write_cstring(buffer, namespace)?;

        for doc in documents {
            Message::write_bson_document(buffer, doc)?;
        }

        Ok(())
    }

    /// Writes a serialized query message to a given buffer.
    ///
    /// # Arguments
    ///
    /// `buffer` - The buffer to write to.
    /// `header` - The header for the given message.
    /// `flags` - Bit vector of query option.
    /// `namespace` - The full qualified name of the collection, beginning with
    ///               the database name and a dot.
    /// `number_to_skip` - The number of initial documents to skip over in the
    ///                    query results.
    /// `number_to_return - The total number of documents that should be
    ///                     returned by the query.
    /// `query` - The encoded query or command document.
    fn write_query<W: Write>(
        buffer: &mut W,
        header: &Header,
        flags: &OpQueryFlags,
        namespace: &str,
        number_to_skip: i32,
        number_to_return: i32,
        query: &[u8],
    ) -> Result<()> {
        header.write(buffer)?;
        buffer.write_i32::<LittleEndian>(flags.bits())?;
        Message::write_cstring(buffer, namespace)?;

        buffer.write_i32::<LittleEndian>(number_to_skip)?;
        buffer.write_i32::<LittleEndian>(number_to_return)?;
        buffer.write_all(query)?;

        Ok(())
    }

    fn write_delete<W: Write>(
        buffer: &mut W,
        header: &Header,
        namespace: &str,
        flags: &OpDeleteFlags,
        selector: &bson::Document,
    ) -> Result<()> {
        header.write(buffer)?;

        // Write ZERO field
        buffer.write_i32::<LittleEndian>(0)?;
        Message::write_cstring(buffer, namespace)?;
        buffer.write_i32::<LittleEndian>(flags.bits())?;

        Message::write_bson_document(buffer, selector)
    }

    /// Attemps to write the serialized message to a buffer.
    ///
    /// # Return value
    ///
    /// Returns nothing on success, or an error on failure.
    pub fn write<W: Write>(&self, buffer: &mut W) -> Result<()> {
        let result = match *self {
            // Only the server should send replies
            Message::OpReply { .. } => {
                Err(ArgumentError(
                    String::from("OP_REPLY should not be sent to the server."),
                ))
            }
            Message::OpUpdate {
                ref header,
                ref namespace,
                ref flags,
                ref selector,
                ref update,
            } => Message::write_update(buffer, header, namespace, flags, selector, update),
            Message::OpInsert {
                ref header,
                ref flags,
                ref namespace,
                ref documents,
            } => Message::write_insert(buffer, header, flags, namespace, documents),
            Message::OpQuery {
                ref header,
                ref flags,
                ref namespace,
                number_to_skip,
                number_to_return,
                ref query,
            } => {
                Message::write_query(
                    buffer,
                    header,
                    flags,
                    namespace,
                    number_to_skip,
                    number_to_return,
                    query,
                )
            }
            Message::OpDelete {
                ref header,
                ref namespace,
                ref flags,
                ref selector,
            } => Message::write_delete(buffer, header, namespace, flags, selector),
        };

        result?;
        buffer.flush()?;
        Ok(())
    }

    /// Reads a serialized reply message from a buffer
    fn read_reply<R: Read>(buffer: &mut R, header: Header) -> Result<Message> {
        let mut length = header.message_length - HEADER_LENGTH;

        // Read flags
        let flags = buffer.read_i32::<LittleEndian>()?;
        length -= mem::size_of::<i32>() as i32;

        // Read cursor_id
        let cid = buffer.read_i64::<LittleEndian>()?;
        length -= mem::size_of::<i64>() as i32;

        // Read starting_from
        let sf = buffer.read_i32::<LittleEndian>()?;
        length -= mem::size_of::<i32>() as i32;

        // Read number_returned
        let nr = buffer.read_i32::<LittleEndian>()?;
        length -= mem::size_of::<i32>() as i32;

        let mut v = vec![];

        while length > 0 {
            let bson = bson::decode_document(buffer)?;
            length -= bson.byte_length()?;
            v.push(bson);
        }

        Ok(Message::new_reply(header, flags, cid, sf, nr, v))
    }

    /// Attempts to read a serialized reply Message from a buffer.
    pub fn read<R: Read>(buffer: &mut R) -> Result<Message> {
        let header = Header::read(buffer)?;
        match header.op_code {
            OpCode::Reply => Message::read_reply(buffer, header),
            opcode => {
                Err(ResponseError(format!(
                    "Expected to read OpCode::Reply but instead found opcode {}",
                    opcode
                )))
            }
        }
    }
}
