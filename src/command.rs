//! Monitored command round trips and legacy write submission.
use bson::{bson, doc, Bson};
use crate::apm::{CommandResult, CommandStarted};
use crate::command_type::CommandType;
use crate::common::WriteConcern;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::server::int_field;
use crate::wire_protocol::flags::OpQueryFlags;
use crate::wire_protocol::operations::Message;

macro_rules! try_or_emit {
    ($conn:expr, $cmd_name:expr, $req_id:expr, $start:expr, $result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => {
                let hook_result = match $conn.listener() {
                    Some(listener) => listener.run_completion_hooks(&CommandResult::Failure {
                        duration: time::precise_time_ns() - $start,
                        command_name: $cmd_name.to_owned(),
                        failure: &e,
                        request_id: $req_id as i64,
                        connection_string: $conn.address(),
                    }),
                    None => Ok(()),
                };

                return match hook_result {
                    Ok(_) => Err(e),
                    Err(_) => Err(Error::EventListenerError(Some(Box::new(e)))),
                };
            }
        }
    };
}

/// Runs a command document against `<db>.$cmd` and returns its reply.
pub fn run_command(
    conn: &mut dyn Connection,
    db: &str,
    cmd_type: CommandType,
    command: &bson::Document,
) -> Result<bson::Document> {
    let mut raw = vec![];
    bson::encode_document(&mut raw, command)?;
    run_raw_command(conn, db, cmd_type, raw)
}

/// Runs an already-encoded command document against `<db>.$cmd`.
///
/// A reply with `ok: 0` is reported as an `OperationError`.
pub fn run_raw_command(
    conn: &mut dyn Connection,
    db: &str,
    cmd_type: CommandType,
    command: Vec<u8>,
) -> Result<bson::Document> {
    execute_raw_command(conn, db, cmd_type, command, true)
}

fn execute_raw_command(
    conn: &mut dyn Connection,
    db: &str,
    cmd_type: CommandType,
    command: Vec<u8>,
    check_ok: bool,
) -> Result<bson::Document> {
    let req_id = conn.next_request_id();
    let message = Message::new_raw_query(req_id, OpQueryFlags::empty(), format!("{}.$cmd", db),
                                         0, -1, command);

    let cmd_name = cmd_type.to_str();
    let start = emit_started(conn, db, cmd_name, req_id, &message)?;

    try_or_emit!(conn, cmd_name, req_id, start, conn.send_message(&message));
    let reply = try_or_emit!(conn, cmd_name, req_id, start, conn.receive_reply(req_id));
    let reply = try_or_emit!(conn, cmd_name, req_id, start, reply.reply_document());
    let reply = if check_ok {
        try_or_emit!(conn, cmd_name, req_id, start, check_command_reply(reply))
    } else {
        reply
    };

    emit_succeeded(conn, cmd_name, req_id, start, &reply)?;
    Ok(reply)
}

/// Sends a single legacy write message. For acknowledged write concerns the write is followed
/// by a `getLastError` command on the same connection, whose reply is returned as is, `ok: 0`
/// included, so the failure can be attributed to the write.
pub fn send_legacy_write(
    conn: &mut dyn Connection,
    db: &str,
    cmd_type: CommandType,
    message: Message,
    write_concern: &WriteConcern,
) -> Result<Option<bson::Document>> {
    let req_id = message.header().request_id;
    let cmd_name = cmd_type.to_str();
    let start = emit_started(conn, db, cmd_name, req_id, &message)?;

    try_or_emit!(conn, cmd_name, req_id, start, conn.send_message(&message));

    if !write_concern.is_acknowledged() {
        emit_succeeded(conn, cmd_name, req_id, start, &doc! { "ok": 1 })?;
        return Ok(None);
    }

    let gle = try_or_emit!(conn, cmd_name, req_id, start, get_last_error(conn, db, write_concern));

    emit_succeeded(conn, cmd_name, req_id, start, &gle)?;
    Ok(Some(gle))
}

fn get_last_error(conn: &mut dyn Connection, db: &str, write_concern: &WriteConcern) -> Result<bson::Document> {
    let mut command = doc! { "getLastError": 1 };
    for (key, value) in write_concern.to_bson() {
        command.insert(key, value);
    }

    let mut raw = vec![];
    bson::encode_document(&mut raw, &command)?;
    execute_raw_command(conn, db, CommandType::GetLastError, raw, false)
}

/// Fails with an `OperationError` unless the reply reports `ok: 1`.
pub fn check_command_reply(reply: bson::Document) -> Result<bson::Document> {
    if int_field(&reply, "ok") == Some(1) {
        return Ok(reply);
    }

    let message = match reply.get("errmsg") {
        Some(&Bson::String(ref s)) => s.to_owned(),
        _ => format!("Command failed: {:?}", reply),
    };

    Err(Error::OperationError(message))
}

fn emit_started(
    conn: &dyn Connection,
    db: &str,
    cmd_name: &str,
    req_id: i32,
    message: &Message,
) -> Result<u64> {
    if let Some(listener) = conn.listener() {
        let hook_result = listener.run_start_hooks(&CommandStarted {
            command: describe(message)?,
            database_name: db.to_owned(),
            command_name: cmd_name.to_owned(),
            request_id: req_id as i64,
            connection_string: conn.address(),
        });

        if hook_result.is_err() {
            return Err(Error::EventListenerError(None));
        }
    }

    Ok(time::precise_time_ns())
}

fn emit_succeeded(
    conn: &dyn Connection,
    cmd_name: &str,
    req_id: i32,
    start: u64,
    reply: &bson::Document,
) -> Result<()> {
    let listener = match conn.listener() {
        Some(listener) => listener,
        None => return Ok(()),
    };

    let hook_result = listener.run_completion_hooks(&CommandResult::Success {
        duration: time::precise_time_ns() - start,
        reply: reply.clone(),
        command_name: cmd_name.to_owned(),
        request_id: req_id as i64,
        connection_string: conn.address(),
    });

    match hook_result {
        Ok(()) => Ok(()),
        Err(_) => Err(Error::EventListenerError(None)),
    }
}

/// Renders an outgoing message as a document for command monitoring.
fn describe(message: &Message) -> Result<bson::Document> {
    Ok(match *message {
        Message::OpQuery { .. } => message.query_document()?,
        Message::OpInsert { ref namespace, ref documents, .. } => {
            let documents: Vec<Bson> = documents.iter().cloned().map(Bson::Document).collect();
            doc! { "insert": namespace.to_owned(), "documents": documents }
        }
        Message::OpUpdate { ref namespace, ref flags, ref selector, ref update, .. } => {
            doc! {
                "update": namespace.to_owned(),
                "q": selector.clone(),
                "u": update.clone(),
                "flags": flags.bits()
            }
        }
        Message::OpDelete { ref namespace, ref flags, ref selector, .. } => {
            doc! { "delete": namespace.to_owned(), "q": selector.clone(), "flags": flags.bits() }
        }
        Message::OpReply { .. } => bson::Document::new(),
    })
}
