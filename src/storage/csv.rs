//! CSV export/import
//!
//! Two columns, `key, value`, no quoting or escaping: a value holding a
//! comma is written as-is and reads back split at the first comma.

use std::io::{BufRead, Write};

use crate::error::{DataError, Result};
use crate::store::{Loader, RecordTable};

pub const HEADER: &str = "key, value";

pub fn write<W: Write>(table: &RecordTable, out: &mut W) -> Result<usize> {
    writeln!(out, "{}", HEADER)?;

    let mut written = 0;
    for (_, record) in table.iter() {
        writeln!(out, "{}, {}", record.key, record.value)?;
        written += 1;
    }
    Ok(written)
}

/// The first line is a header and is skipped whatever it says
pub fn read<R: BufRead>(loader: &mut Loader<'_>, input: R) -> Result<usize> {
    for line in super::lines(input).skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(',')
            .ok_or_else(|| DataError::syntax(format!("missing comma: {}", line)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DataError::syntax(format!("empty key: {}", line)));
        }
        let value = value.strip_prefix(' ').unwrap_or(value);

        loader.push(key.to_string(), value.to_string(), &[])?;
    }
    Ok(loader.loaded())
}
