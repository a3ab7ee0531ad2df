//! Response definitions
//!
//! Represents replies to clients.

use std::fmt;

use crate::error::DataError;
use crate::store::Usage;

/// A reply line to send to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `OK`
    Ok,

    /// A payload line: value, key, link count or link name
    Value(String),

    /// `ERROR`
    Error,

    /// `ERROR! UNKNOWN COMMAND!`
    UnknownCommand,

    /// `USAGE <percent>% : <used> of <capacity>`
    Usage(Usage),
}

impl Response {
    /// Collapse an error into its wire reply. Only an unknown command has
    /// its own reply; every other cause is a bare `ERROR`.
    pub fn from_error(error: &DataError) -> Self {
        match error {
            DataError::UnknownCommand(_) => Response::UnknownCommand,
            _ => Response::Error,
        }
    }

    /// Bytes sent on the wire, newline included
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => f.write_str("OK"),
            Response::Value(payload) => f.write_str(payload),
            Response::Error => f.write_str("ERROR"),
            Response::UnknownCommand => f.write_str("ERROR! UNKNOWN COMMAND!"),
            Response::Usage(usage) => write!(f, "{}", usage),
        }
    }
}
