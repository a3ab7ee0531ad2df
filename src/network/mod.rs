//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - Admission (whitelist, blacklist, connection cap) before any protocol byte
//! - One thread per admitted connection, each with its own [`Session`]
//! - Commands routed through the shared Engine

mod server;
mod connection;
pub mod session;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use session::{Action, Outcome, Session, SessionState};
