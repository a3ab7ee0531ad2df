//! Command definitions
//!
//! Represents commands from clients, parsed from one line each.

use std::fmt;

use crate::error::{DataError, Result};
use crate::storage::Format;

use super::codec::{extract_key, extract_value, split_key_value, WIRE_QUOTE};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    StoreNew,
    Store,
    GetRegexKey,
    GetRegexValue,
    GetKey,
    GetValue,
    Remove,
    Close,
    Exit,
    Login,
    Save,
    Load,
    JsonExport,
    JsonImport,
    CsvTableExport,
    CsvTableImport,
    CsvExport,
    CsvImport,
    EraseAll,
    Usage,
    SetLink,
    RemoveLink,
    LinkCount,
    LinkName,
}

impl CommandType {
    /// Command tokens in matching order.
    ///
    /// Lines are matched by prefix, so a token that is a prefix of another
    /// (`store data` / `store data new`) must come after it.
    pub const VOCABULARY: [(&'static str, CommandType); 24] = [
        ("store data new", CommandType::StoreNew),
        ("store data", CommandType::Store),
        ("get regex key", CommandType::GetRegexKey),
        ("get regex value", CommandType::GetRegexValue),
        ("get key", CommandType::GetKey),
        ("get value", CommandType::GetValue),
        ("get-links-number", CommandType::LinkCount),
        ("get-link-name", CommandType::LinkName),
        ("remove", CommandType::Remove),
        ("close", CommandType::Close),
        ("exit", CommandType::Exit),
        ("login", CommandType::Login),
        ("save", CommandType::Save),
        ("load", CommandType::Load),
        ("json-export", CommandType::JsonExport),
        ("json-import", CommandType::JsonImport),
        ("csv-table-export", CommandType::CsvTableExport),
        ("csv-table-import", CommandType::CsvTableImport),
        ("csv-export", CommandType::CsvExport),
        ("csv-import", CommandType::CsvImport),
        ("erase all", CommandType::EraseAll),
        ("usage", CommandType::Usage),
        ("set-link", CommandType::SetLink),
        ("rem-link", CommandType::RemoveLink),
    ];

    /// First vocabulary entry the line starts with
    pub fn match_prefix(line: &str) -> Option<CommandType> {
        Self::VOCABULARY
            .iter()
            .find(|(token, _)| line.starts_with(token))
            .map(|(_, command_type)| *command_type)
    }

    pub fn token(self) -> &'static str {
        Self::VOCABULARY
            .iter()
            .find(|(_, command_type)| *command_type == self)
            .map(|(token, _)| *token)
            .unwrap_or("")
    }

    /// Needs a role other than read-only
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            CommandType::Store
                | CommandType::StoreNew
                | CommandType::Remove
                | CommandType::Save
                | CommandType::JsonExport
                | CommandType::CsvExport
                | CommandType::CsvTableExport
                | CommandType::EraseAll
                | CommandType::SetLink
                | CommandType::RemoveLink
        )
    }

    /// Needs the admin role
    pub fn requires_admin(self) -> bool {
        matches!(self, CommandType::EraseAll | CommandType::Exit)
    }

    fn save_format(self) -> Option<Format> {
        match self {
            CommandType::Save => Some(Format::Native),
            CommandType::JsonExport => Some(Format::Json),
            CommandType::CsvExport => Some(Format::Csv),
            CommandType::CsvTableExport => Some(Format::CsvTable),
            _ => None,
        }
    }

    fn load_format(self) -> Option<Format> {
        match self {
            CommandType::Load => Some(Format::Native),
            CommandType::JsonImport => Some(Format::Json),
            CommandType::CsvImport => Some(Format::Csv),
            CommandType::CsvTableImport => Some(Format::CsvTable),
            _ => None,
        }
    }

    fn for_save(format: Format) -> CommandType {
        match format {
            Format::Native => CommandType::Save,
            Format::Json => CommandType::JsonExport,
            Format::Csv => CommandType::CsvExport,
            Format::CsvTable => CommandType::CsvTableExport,
        }
    }

    fn for_load(format: Format) -> CommandType {
        match format {
            Format::Native => CommandType::Load,
            Format::Json => CommandType::JsonImport,
            Format::Csv => CommandType::CsvImport,
            Format::CsvTable => CommandType::CsvTableImport,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert or overwrite in place
    Store { key: String, value: String },

    /// Insert into the first free slot without checking for the key
    StoreNew { key: String, value: String },

    /// Exact key lookup
    GetKey { key: String },

    /// Exact value lookup (replies with the key)
    GetValue { value: String },

    /// Pattern lookup on keys
    GetRegexKey { pattern: String },

    /// Pattern lookup on values (replies with the key)
    GetRegexValue { pattern: String },

    /// Remove a record and reply with its value
    Remove { key: String },

    /// End this connection
    Close,

    /// Stop the server (admin only)
    Exit,

    /// Authenticate
    Login { user: String, password: String },

    /// Write the table to a file below the database root
    Save { format: Format, path: String },

    /// Load a file below the database root into the table
    Load { format: Format, path: String },

    EraseAll,
    Usage,

    SetLink { key: String, target: String },
    RemoveLink { key: String, target: String },

    /// Reply with the number of outgoing links
    LinkCount { key: String },

    /// Reply with the key of the `index`-th link
    LinkName { key: String, index: usize },
}

impl Command {
    /// Parse a command line (without its newline)
    pub fn parse(line: &str) -> Result<Command> {
        let command_type = CommandType::match_prefix(line)
            .ok_or_else(|| DataError::UnknownCommand(line.to_string()))?;

        let key_value = || -> Result<(String, String)> {
            let (key, value) = split_key_value(line, WIRE_QUOTE)?;
            Ok((key.to_string(), value.to_string()))
        };
        let key = || extract_key(line).map(str::to_string);
        let value = || extract_value(line, WIRE_QUOTE).map(str::to_string);
        let path = || -> Result<String> {
            let path = value()?;
            if path.is_empty() {
                return Err(DataError::syntax("empty file name"));
            }
            Ok(path)
        };

        let command = match command_type {
            CommandType::Store => {
                let (key, value) = key_value()?;
                Command::Store { key, value }
            }
            CommandType::StoreNew => {
                let (key, value) = key_value()?;
                Command::StoreNew { key, value }
            }
            CommandType::GetKey => Command::GetKey { key: key()? },
            CommandType::GetValue => Command::GetValue { value: value()? },
            CommandType::GetRegexKey => Command::GetRegexKey { pattern: key()? },
            CommandType::GetRegexValue => Command::GetRegexValue { pattern: value()? },
            CommandType::Remove => Command::Remove { key: key()? },
            CommandType::Close => Command::Close,
            CommandType::Exit => Command::Exit,
            CommandType::Login => {
                let (user, password) = key_value()?;
                Command::Login { user, password }
            }
            CommandType::EraseAll => Command::EraseAll,
            CommandType::Usage => Command::Usage,
            CommandType::SetLink => {
                let (key, target) = key_value()?;
                Command::SetLink { key, target }
            }
            CommandType::RemoveLink => {
                let (key, target) = key_value()?;
                Command::RemoveLink { key, target }
            }
            CommandType::LinkCount => Command::LinkCount { key: key()? },
            CommandType::LinkName => {
                let (key, index) = key_value()?;
                let index = index
                    .trim()
                    .parse()
                    .map_err(|_| DataError::syntax(format!("invalid link index: {}", index)))?;
                Command::LinkName { key, index }
            }
            other => {
                if let Some(format) = other.save_format() {
                    Command::Save { format, path: path()? }
                } else if let Some(format) = other.load_format() {
                    Command::Load { format, path: path()? }
                } else {
                    return Err(DataError::UnknownCommand(line.to_string()));
                }
            }
        };
        Ok(command)
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Store { .. } => CommandType::Store,
            Command::StoreNew { .. } => CommandType::StoreNew,
            Command::GetKey { .. } => CommandType::GetKey,
            Command::GetValue { .. } => CommandType::GetValue,
            Command::GetRegexKey { .. } => CommandType::GetRegexKey,
            Command::GetRegexValue { .. } => CommandType::GetRegexValue,
            Command::Remove { .. } => CommandType::Remove,
            Command::Close => CommandType::Close,
            Command::Exit => CommandType::Exit,
            Command::Login { .. } => CommandType::Login,
            Command::Save { format, .. } => CommandType::for_save(*format),
            Command::Load { format, .. } => CommandType::for_load(*format),
            Command::EraseAll => CommandType::EraseAll,
            Command::Usage => CommandType::Usage,
            Command::SetLink { .. } => CommandType::SetLink,
            Command::RemoveLink { .. } => CommandType::RemoveLink,
            Command::LinkCount { .. } => CommandType::LinkCount,
            Command::LinkName { .. } => CommandType::LinkName,
        }
    }
}

/// Wire encoding of a command, without the newline
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.command_type().token();
        match self {
            Command::Store { key, value } | Command::StoreNew { key, value } => {
                write!(f, "{} :{} '{}'", token, key, value)
            }
            Command::GetKey { key }
            | Command::Remove { key }
            | Command::LinkCount { key }
            | Command::GetRegexKey { pattern: key } => write!(f, "{} :{}", token, key),
            Command::GetValue { value }
            | Command::GetRegexValue { pattern: value }
            | Command::Save { path: value, .. }
            | Command::Load { path: value, .. } => write!(f, "{} '{}'", token, value),
            Command::Login { user, password } => write!(f, "{} :{} '{}'", token, user, password),
            Command::SetLink { key, target } | Command::RemoveLink { key, target } => {
                write!(f, "{} :{} '{}'", token, key, target)
            }
            Command::LinkName { key, index } => write!(f, "{} :{} '{}'", token, key, index),
            Command::Close | Command::Exit | Command::EraseAll | Command::Usage => {
                f.write_str(token)
            }
        }
    }
}
