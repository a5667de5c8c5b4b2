use std::fmt::{Display, Error, Formatter};

use bson::Document;
use crate::error::Error as MongoError;

pub struct CommandStarted {
    pub command: Document,
    pub database_name: String,
    pub command_name: String,
    pub request_id: i64,
    pub connection_string: String,
}

impl Display for CommandStarted {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        fmt.write_fmt(format_args!("COMMAND.{} {} STARTED: {:?}", self.command_name,
                                   self.connection_string, self.command))
    }
}

pub enum CommandResult<'a> {
    Success {
        duration: u64,
        reply: Document,
        command_name: String,
        request_id: i64,
        connection_string: String,
    },
    Failure {
        duration: u64,
        command_name: String,
        failure: &'a MongoError,
        request_id: i64,
        connection_string: String,
    }
}

impl<'a> CommandResult<'a> {
    pub fn command_name(&self) -> &str {
        match *self {
            CommandResult::Success { ref command_name, .. } |
            CommandResult::Failure { ref command_name, .. } => command_name,
        }
    }

    pub fn is_success(&self) -> bool {
        match *self {
            CommandResult::Success { .. } => true,
            CommandResult::Failure { .. } => false,
        }
    }
}

impl<'a> Display for CommandResult<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        match *self {
            CommandResult::Success { duration, ref reply, ref command_name,
                                     ref connection_string, .. } => {
                fmt.write_fmt(format_args!("COMMAND.{} {} COMPLETED: {:?} ({} ns)", command_name,
                                           connection_string, reply, duration))
            },
            CommandResult::Failure { duration, ref command_name, failure,
                                     ref connection_string, .. } => {
                fmt.write_fmt(format_args!("COMMAND.{} {} FAILURE: {} ({} ns)", command_name,
                                           connection_string, failure, duration))
            }
        }
    }
}
