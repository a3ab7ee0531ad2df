//! Protocol Module
//!
//! Defines the line protocol for client-server communication.
//!
//! ## Request Format
//! One command per line. The line starts with a command token; arguments
//! are a key (`:key`, up to the next space) and/or a value (`'value'`,
//! between the only two single quotes on the line):
//!
//! ```text
//! store data :water 'H2O'
//! get key :water
//! get value 'H2O'
//! set-link :water 'hydrogen'
//! save 'chemistry.l1db'
//! ```
//!
//! ## Replies
//! - `OK`
//! - the requested payload (a value, key, count or link name)
//! - `ERROR` for any failed request, whatever the cause
//! - `ERROR! UNKNOWN COMMAND!`
//! - `USAGE <percent>% : <used> of <capacity>`

mod command;
mod response;
pub mod codec;

pub use command::{Command, CommandType};
pub use response::Response;
pub use codec::{read_line, read_response, write_line, write_response, MAX_LINE_LEN};
