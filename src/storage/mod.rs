//! Storage Module
//!
//! Bulk save and load of the record table in four text formats.
//!
//! ## Formats
//! ```text
//! native     l1vmgodata database
//!            :key "value"
//!            :link "N"            (link count, then N lines)
//!            :link "<slot>"
//!
//! json       { "l1vmgodata database" :[
//!            { "key": "k", "value": "v" },
//!            ...
//!            ]
//!            }
//!
//! csv        key, value
//!            k, v
//!
//! csv table  substance, chemical, boiling
//!            water, H2O, 100      (records 1-1-substance, 1-2-chemical, ...)
//! ```
//!
//! ## Load Semantics
//! Loads are additive: they start at the table's fill position, so several
//! files can be merged. Running out of slots stops the load with
//! `Overflow` and keeps what was already placed. Native link lists are raw
//! slot indices and are only meaningful if the file is loaded into an
//! empty table in one piece.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::store::RecordTable;

pub mod native;
pub mod json;
pub mod csv;
pub mod pivot;

/// Persistence format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Native,
    Json,
    Csv,
    CsvTable,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Native, Format::Json, Format::Csv, Format::CsvTable];
}

/// Write the whole table to `path` (truncating it). Returns records written.
pub fn save(table: &RecordTable, format: Format, path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    let written = match format {
        Format::Native => native::write(table, &mut out)?,
        Format::Json => json::write(table, &mut out)?,
        Format::Csv => csv::write(table, &mut out)?,
        Format::CsvTable => pivot::write(table, &mut out)?,
    };
    out.flush()?;

    tracing::debug!("saved {} records as {:?} to {}", written, format, path.display());
    Ok(written)
}

/// Load `path` into the table after its current contents. Returns records placed.
pub fn load(table: &mut RecordTable, format: Format, path: &Path) -> Result<usize> {
    let input = BufReader::new(File::open(path)?);
    let mut loader = table.loader();
    let start = loader.position();

    let loaded = match format {
        Format::Native => native::read(&mut loader, input)?,
        Format::Json => json::read(&mut loader, input)?,
        Format::Csv => csv::read(&mut loader, input)?,
        Format::CsvTable => pivot::read(&mut loader, input)?,
    };

    tracing::debug!(
        "loaded {} records as {:?} from {} at slot {}",
        loaded,
        format,
        path.display(),
        start
    );
    Ok(loaded)
}

/// Lines of `input` with trailing `\r` removed
pub(crate) fn lines<R: std::io::BufRead>(input: R) -> impl Iterator<Item = Result<String>> {
    input.lines().map(|line| {
        let mut line = line?;
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    })
}
