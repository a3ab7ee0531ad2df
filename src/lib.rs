//! # l1data
//!
//! An in-memory key-value store with:
//! - A fixed-capacity slot table that grows on demand
//! - Directed links between records (a small graph overlay)
//! - A line-oriented TCP protocol with role-gated access
//! - Four text persistence formats (native, JSON, CSV, CSV table)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │       (whitelist / blacklist check, thread per client)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Session                                    │
//! │       (login, lockout, role checks, command dispatch)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Engine    │          │   Access    │
//!   │  (Mutex)    │          │  (users,    │
//!   └──────┬──────┘          │  ip lists)  │
//!          │                 └─────────────┘
//!          ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ RecordTable │◀────────▶│   Storage   │
//!   │  + links    │          │ (4 formats) │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod storage;
pub mod protocol;
pub mod access;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DataError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of l1data
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
