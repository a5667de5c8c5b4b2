//! Monitorable command types.

/// Executable command types that can be monitored by the driver.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CommandType {
    BuildInfo,
    Delete,
    GetLastError,
    Insert,
    IsMaster,
    Update,
}

impl CommandType {
    pub fn to_str(&self) -> &str {
        match *self {
            CommandType::BuildInfo => "buildinfo",
            CommandType::Delete => "delete",
            CommandType::GetLastError => "getlasterror",
            CommandType::Insert => "insert",
            CommandType::IsMaster => "ismaster",
            CommandType::Update => "update",
        }
    }
}
