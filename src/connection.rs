//! The connection seam the bulk write engine talks to the server through.
use bufstream::BufStream;
use bson::{bson, doc};
use crate::apm::Listener;
use crate::command;
use crate::command_type::CommandType;
use crate::error::{Error, Result};
use crate::server::ConnectionDescription;
use crate::wire_protocol::operations::Message;
use semver::Version;

use std::net::TcpStream;

/// A single, exclusively-owned connection to a server.
///
/// Operations borrow a connection mutably for their whole execution, so batches are always
/// sent strictly one after another.
pub trait Connection {
    /// The negotiated description of the server at the other end.
    fn description(&self) -> &ConnectionDescription;

    /// Allocates the id for the next outgoing message.
    fn next_request_id(&mut self) -> i32;

    /// Writes a message to the server.
    fn send_message(&mut self, message: &Message) -> Result<()>;

    /// Reads the reply to the message with the given request id.
    fn receive_reply(&mut self, response_to: i32) -> Result<Message>;

    /// A human-readable address used for command monitoring.
    fn address(&self) -> String {
        String::from("unknown")
    }

    /// The command monitoring listener attached to this connection, if any.
    fn listener(&self) -> Option<&Listener> {
        None
    }
}

/// A connection over a buffered TCP stream.
pub struct StreamConnection {
    host: String,
    port: u16,
    stream: BufStream<TcpStream>,
    description: ConnectionDescription,
    request_id: i32,
    listener: Listener,
}

impl StreamConnection {
    /// Connects to the server and runs the `isMaster` / `buildInfo` handshake.
    pub fn connect(host: &str, port: u16) -> Result<StreamConnection> {
        let stream = TcpStream::connect((host, port))?;

        let mut conn = StreamConnection {
            host: host.to_owned(),
            port: port,
            stream: BufStream::new(stream),
            description: ConnectionDescription::new(Version::new(0, 0, 0), 0),
            request_id: 0,
            listener: Listener::new(),
        };

        conn.handshake()?;
        Ok(conn)
    }

    /// Returns the listener used to register command monitoring hooks.
    pub fn event_listener(&self) -> &Listener {
        &self.listener
    }

    fn handshake(&mut self) -> Result<()> {
        let is_master = command::run_command(self, "admin", CommandType::IsMaster,
                                             &doc! { "isMaster": 1 })?;
        let build_info = command::run_command(self, "admin", CommandType::BuildInfo,
                                              &doc! { "buildInfo": 1 })?;

        self.description = ConnectionDescription::from_replies(&is_master, &build_info)?;

        tracing::info!(
            address = %self.address(),
            version = %self.description.server_version,
            max_wire_version = self.description.max_wire_version,
            "connected"
        );

        Ok(())
    }
}

impl Connection for StreamConnection {
    fn description(&self) -> &ConnectionDescription {
        &self.description
    }

    fn next_request_id(&mut self) -> i32 {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id
    }

    fn send_message(&mut self, message: &Message) -> Result<()> {
        message.write(&mut self.stream)
    }

    fn receive_reply(&mut self, response_to: i32) -> Result<Message> {
        let reply = Message::read(&mut self.stream)?;

        if reply.header().response_to != response_to {
            return Err(Error::ResponseError(format!(
                "Expected a reply to request {}, but received one to request {}.",
                response_to,
                reply.header().response_to
            )));
        }

        Ok(reply)
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn listener(&self) -> Option<&Listener> {
        Some(&self.listener)
    }
}
