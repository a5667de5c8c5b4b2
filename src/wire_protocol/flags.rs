//! Operation flags.
use bitflags::bitflags;

bitflags! {
    /// Represents the bit vector of options for an OP_REPLY message.
    pub struct OpReplyFlags: i32 {
        const CURSOR_NOT_FOUND  = 0b00000001;
        const QUERY_FAILURE     = 0b00000010;
        const AWAIT_CAPABLE     = 0b00001000;
    }
}

bitflags! {
    /// Represents the bit vector of options for an OP_UPDATE message.
    pub struct OpUpdateFlags: i32 {
        const UPSERT       = 0b00000001;
        const MULTI_UPDATE = 0b00000010;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_INSERT message.
    pub struct OpInsertFlags: i32 {
        const CONTINUE_ON_ERROR = 0b00000001;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_QUERY message.
    pub struct OpQueryFlags: i32 {
        const TAILABLE_CURSOR   = 0b00000010;
        const SLAVE_OK          = 0b00000100;
        const NO_CURSOR_TIMEOUT = 0b00010000;
    }
}

bitflags! {
    /// Represents the bit vector of flags for an OP_DELETE message.
    pub struct OpDeleteFlags: i32 {
        const SINGLE_REMOVE = 0b00000001;
    }
}

impl OpUpdateFlags {
    /// Builds the flags for a single emulated update statement.
    pub fn with_options(upsert: bool, multi: bool) -> OpUpdateFlags {
        let mut flags = OpUpdateFlags::empty();

        if upsert {
            flags.insert(Self::UPSERT);
        }

        if multi {
            flags.insert(Self::MULTI_UPDATE);
        }

        flags
    }
}

impl OpDeleteFlags {
    /// Builds the flags for a delete statement with the given limit, where `1` removes at most
    /// one document and `0` removes every match.
    pub fn with_limit(limit: i32) -> OpDeleteFlags {
        if limit == 1 {
            Self::SINGLE_REMOVE
        } else {
            OpDeleteFlags::empty()
        }
    }
}
