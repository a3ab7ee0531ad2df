//! Engine Module
//!
//! The shared store object handed to every connection.
//!
//! ## Responsibilities
//! - Own the record table behind one coarse lock
//! - Take that lock once per logical operation, never per client request
//! - Resolve wire file names below the database root
//! - Map parsed data commands to table operations and replies

use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use regex::Regex;

use crate::config::Config;
use crate::error::{DataError, Result};
use crate::protocol::{Command, Response};
use crate::storage::{self, Format};
use crate::store::{RecordTable, Usage};

/// The store engine
///
/// ## Concurrency Model: one table, one lock
///
/// Every public method locks the table for exactly its own duration. Scans
/// (pattern lookups, remove with its link sweep, save/load, growth) hold it
/// for the whole traversal, so all other connections wait on them. Patterns
/// are compiled before the lock is taken.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Record table and link graph
    table: Mutex<RecordTable>,
}

impl Engine {
    /// Allocate the initial table described by `config`
    pub fn new(config: Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(DataError::Config("capacity must be at least 1".to_string()));
        }
        if let Some(max) = config.max_capacity {
            if max < config.capacity {
                return Err(DataError::Config(format!(
                    "max capacity {} is below initial capacity {}",
                    max, config.capacity
                )));
            }
        }

        let table = RecordTable::with_max_capacity(config.capacity, config.max_capacity);
        tracing::info!("record table allocated with {} slots", config.capacity);

        Ok(Self {
            config,
            table: Mutex::new(table),
        })
    }

    /// Run `f` with the table locked
    pub fn with_table<T>(&self, f: impl FnOnce(&mut RecordTable) -> T) -> T {
        let mut table = self.table.lock();
        f(&mut table)
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// UpsertOrInsert
    pub fn store(&self, key: &str, value: &str) -> Result<usize> {
        self.table.lock().store(key, value)
    }

    /// BlindInsert
    pub fn store_fast(&self, key: &str, value: &str) -> Result<usize> {
        self.table.lock().store_fast(key, value)
    }

    /// Exact key lookup
    pub fn get(&self, key: &str) -> Result<String> {
        self.table.lock().lookup_key(key).map(str::to_string)
    }

    /// Value of the first record whose key matches `pattern`
    pub fn get_matching(&self, pattern: &str) -> Result<String> {
        let pattern = Regex::new(pattern)?;
        self.table
            .lock()
            .lookup_key_matching(&pattern)
            .map(str::to_string)
    }

    /// Key of the first record whose value equals `value`
    pub fn find_key(&self, value: &str) -> Result<String> {
        self.table.lock().lookup_value(value).map(str::to_string)
    }

    /// Key of the first record whose value matches `pattern`
    pub fn find_key_matching(&self, pattern: &str) -> Result<String> {
        let pattern = Regex::new(pattern)?;
        self.table
            .lock()
            .lookup_value_matching(&pattern)
            .map(str::to_string)
    }

    pub fn remove(&self, key: &str) -> Result<String> {
        self.table.lock().remove(key)
    }

    pub fn erase_all(&self) {
        self.table.lock().erase_all();
        tracing::info!("record table erased");
    }

    pub fn usage(&self) -> Usage {
        self.table.lock().usage()
    }

    pub fn capacity(&self) -> usize {
        self.table.lock().capacity()
    }

    /// Grow the table one step without inserting anything
    pub fn grow(&self) -> Result<()> {
        self.table.lock().grow()
    }

    // =========================================================================
    // Links
    // =========================================================================

    pub fn set_link(&self, key: &str, target: &str) -> Result<()> {
        self.table.lock().set_link(key, target)
    }

    pub fn remove_link(&self, key: &str, target: &str) -> Result<()> {
        self.table.lock().remove_link(key, target)
    }

    pub fn link_count(&self, key: &str) -> Result<usize> {
        self.table.lock().link_count(key)
    }

    pub fn link_at(&self, key: &str, index: usize) -> Result<String> {
        self.table.lock().link_at(key, index).map(str::to_string)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save the table to `path` as given (no database root resolution)
    pub fn save(&self, format: Format, path: &Path) -> Result<usize> {
        let table = self.table.lock();
        storage::save(&table, format, path)
    }

    /// Load `path` after the current contents (no database root resolution)
    pub fn load(&self, format: Format, path: &Path) -> Result<usize> {
        let mut table = self.table.lock();
        storage::load(&mut table, format, path)
    }

    /// Map a file name from the wire onto the database root.
    ///
    /// Absolute names and names containing `..` are rejected.
    pub fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if name.is_empty() || escapes {
            return Err(DataError::syntax(format!("file name not allowed: {}", name)));
        }
        Ok(self.config.database_root.join(relative))
    }

    // =========================================================================
    // Command Dispatch
    // =========================================================================

    /// Execute a data command. Permissions are checked by the caller.
    ///
    /// `close`, `exit` and `login` act on the session, not on the store;
    /// they reply `OK` here without touching the table.
    pub fn execute(&self, command: &Command) -> Result<Response> {
        let response = match command {
            Command::Store { key, value } => {
                self.store(key, value)?;
                Response::Ok
            }
            Command::StoreNew { key, value } => {
                self.store_fast(key, value)?;
                Response::Ok
            }
            Command::GetKey { key } => payload(self.get(key)?),
            Command::GetValue { value } => payload(self.find_key(value)?),
            Command::GetRegexKey { pattern } => payload(self.get_matching(pattern)?),
            Command::GetRegexValue { pattern } => payload(self.find_key_matching(pattern)?),
            Command::Remove { key } => payload(self.remove(key)?),
            Command::Save { format, path } => {
                let path = self.resolve_path(path)?;
                self.save(*format, &path)?;
                Response::Ok
            }
            Command::Load { format, path } => {
                let path = self.resolve_path(path)?;
                self.load(*format, &path)?;
                Response::Ok
            }
            Command::EraseAll => {
                self.erase_all();
                Response::Ok
            }
            Command::Usage => Response::Usage(self.usage()),
            Command::SetLink { key, target } => {
                self.set_link(key, target)?;
                Response::Ok
            }
            Command::RemoveLink { key, target } => {
                self.remove_link(key, target)?;
                Response::Ok
            }
            Command::LinkCount { key } => Response::Value(self.link_count(key)?.to_string()),
            Command::LinkName { key, index } => payload(self.link_at(key, *index)?),
            Command::Close | Command::Exit | Command::Login { .. } => Response::Ok,
        };
        Ok(response)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// An empty payload is indistinguishable from "not found" on the wire
fn payload(text: String) -> Response {
    if text.is_empty() {
        Response::Error
    } else {
        Response::Value(text)
    }
}
