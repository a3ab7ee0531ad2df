//! Store Module
//!
//! The record table and the link graph layered on it.
//!
//! ## Responsibilities
//! - Fixed-capacity slot table with first-free allocation
//! - Exact and pattern lookups by key or by value (full scans)
//! - Removal with a referential-integrity sweep over every link list
//! - Growth by a round trip through the native file format
//! - Additive bulk loading for the persistence formats
//!
//! ## Data Structure Choice
//! A plain `Vec<Slot>` indexed by position. Lookups are linear scans; there
//! is no secondary index. Slot identity is the position, so removal never
//! compacts. Links hold a [`SlotHandle`] (position + generation) so a link
//! to a vacated slot can be told apart from one to its later occupant.

mod record;
mod table;
mod links;

pub use record::{Record, Slot, SlotHandle};
pub use table::{Loader, RecordTable, Usage};
