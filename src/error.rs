//! Error types for l1data
//!
//! Provides a unified error type for all operations. The session layer
//! collapses every variant into a bare `ERROR` reply, so the detail here is
//! for logs and library callers only.

use thiserror::Error;

/// Result type alias using DataError
pub type Result<T> = std::result::Result<T, DataError>;

/// Unified error type for l1data operations
#[derive(Debug, Error)]
pub enum DataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Syntax Errors (wire lines and file grammars)
    // -------------------------------------------------------------------------
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Value not found: {0}")]
    ValueNotFound(String),

    #[error("No link from {key} to {target}")]
    LinkNotFound { key: String, target: String },

    #[error("Link index {index} out of range for {key} ({count} links)")]
    LinkIndexOutOfRange { key: String, index: usize, count: usize },

    #[error("Link to slot {index} is stale")]
    StaleLink { index: usize },

    #[error("{key} is already linked to {target}")]
    AlreadyLinked { key: String, target: String },

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Capacity exhausted: {capacity} slots in use")]
    CapacityExhausted { capacity: usize },

    #[error("Load overflow: table full at {capacity} slots after {loaded} records")]
    Overflow { capacity: usize, loaded: usize },

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    #[error("Permission denied: {command} requires {required}")]
    PermissionDenied {
        command: &'static str,
        required: &'static str,
    },

    #[error("Authentication failed for user {0}")]
    Authentication(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// True for every "absent" variant (key, value, link or link slot)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataError::KeyNotFound(_)
                | DataError::ValueNotFound(_)
                | DataError::LinkNotFound { .. }
                | DataError::LinkIndexOutOfRange { .. }
                | DataError::StaleLink { .. }
        )
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        DataError::Syntax(message.into())
    }
}
