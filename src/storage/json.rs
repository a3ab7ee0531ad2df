//! JSON export/import
//!
//! A fixed-shape emitter and line scanner, not a JSON parser. Files written
//! here look like:
//!
//! ```text
//! { "l1vmgodata database" :[
//! { "key": "water", "value": "H2O" },
//! { "key": "iron", "value": "Fe" }
//! ]
//! }
//! ```

use std::io::{BufRead, Write};

use crate::error::{DataError, Result};
use crate::store::{Loader, RecordTable};

/// First line of every JSON export
pub const HEADER: &str = "{ \"l1vmgodata database\" :[";

const KEY_LABEL: &str = "\"key\":";
const VALUE_LABEL: &str = "\"value\":";

pub fn write<W: Write>(table: &RecordTable, out: &mut W) -> Result<usize> {
    writeln!(out, "{}", HEADER)?;

    let mut written = 0;
    for (_, record) in table.iter() {
        // Separator goes before every record but the first: no trailing comma
        if written > 0 {
            writeln!(out, ",")?;
        }
        write!(
            out,
            "{{ \"key\": \"{}\", \"value\": \"{}\" }}",
            record.key, record.value
        )?;
        written += 1;
    }
    if written > 0 {
        writeln!(out)?;
    }

    write!(out, "]\n}}\n")?;
    Ok(written)
}

/// Lines without a `"key":` field (brackets, braces) are skipped
pub fn read<R: BufRead>(loader: &mut Loader<'_>, input: R) -> Result<usize> {
    let mut lines = super::lines(input);

    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(0),
    };
    if header != HEADER {
        return Err(DataError::syntax("not a json l1vmgodata database"));
    }

    for line in lines {
        let line = line?;
        let Some(key) = quoted_after(&line, KEY_LABEL) else {
            continue;
        };
        let value = quoted_after(&line, VALUE_LABEL)
            .ok_or_else(|| DataError::syntax(format!("record without value: {}", line)))?;
        if key.is_empty() {
            continue;
        }
        loader.push(key.to_string(), value.to_string(), &[])?;
    }
    Ok(loader.loaded())
}

/// Text between the first pair of double quotes following `label`
fn quoted_after<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = &line[line.find(label)? + label.len()..];
    let rest = &rest[rest.find('"')? + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}
