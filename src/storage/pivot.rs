//! CSV table (pivot) export/import
//!
//! Maps a two-dimensional table onto records with composite keys
//! `<row>-<column>-<columnName>`, rows and columns counted from 1:
//!
//! ```text
//! substance, chemical, boiling       :1-1-substance "water"
//! water, H2O, 100             <=>    :1-2-chemical "H2O"
//! iron, Fe, 3070                     :1-3-boiling "100"
//!                                    :2-1-substance "iron" ...
//! ```
//!
//! Export reads the header from row 1, probing columns 1.. until one is
//! missing, then emits rows 1.. until a row has no column 1. Records whose
//! key is not a composite key are not exported.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::error::{DataError, Result};
use crate::store::{Loader, RecordTable};

/// Split `row-column-name` into its parts
pub fn parse_composite(key: &str) -> Option<(usize, usize, &str)> {
    let mut parts = key.splitn(3, '-');
    let row = parts.next()?.parse().ok()?;
    let column = parts.next()?.parse().ok()?;
    let name = parts.next().filter(|name| !name.is_empty())?;
    Some((row, column, name))
}

pub fn composite_key(row: usize, column: usize, name: &str) -> String {
    format!("{}-{}-{}", row, column, name)
}

/// Returns the number of data rows written
pub fn write<W: Write>(table: &RecordTable, out: &mut W) -> Result<usize> {
    // First record for each (row, column) wins, as a slot-order scan would
    let mut cells: BTreeMap<(usize, usize), (&str, &str)> = BTreeMap::new();
    for (_, record) in table.iter() {
        if let Some((row, column, name)) = parse_composite(&record.key) {
            cells
                .entry((row, column))
                .or_insert((name, record.value.as_str()));
        }
    }

    let header: Vec<&str> = (1..)
        .map_while(|column| cells.get(&(1, column)).map(|(name, _)| *name))
        .collect();
    if header.is_empty() {
        return Ok(0);
    }
    writeln!(out, "{}", header.join(", "))?;

    let mut rows = 0;
    for row in 1.. {
        if !cells.contains_key(&(row, 1)) {
            break;
        }
        // Missing cells are written empty to keep the columns aligned
        let line: Vec<&str> = (1..=header.len())
            .map(|column| cells.get(&(row, column)).map(|(_, value)| *value).unwrap_or(""))
            .collect();
        writeln!(out, "{}", line.join(", "))?;
        rows += 1;
    }
    Ok(rows)
}

/// Empty cells are skipped; cells beyond the header are ignored
pub fn read<R: BufRead>(loader: &mut Loader<'_>, input: R) -> Result<usize> {
    let mut lines = super::lines(input);

    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Ok(0),
        }
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    if columns.iter().any(|name| name.is_empty()) {
        return Err(DataError::syntax(format!("empty column name: {}", header)));
    }

    let mut row = 0;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        row += 1;

        for (column, (name, cell)) in columns.iter().zip(line.split(',')).enumerate() {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            loader.push(composite_key(row, column + 1, name), cell.to_string(), &[])?;
        }
    }
    Ok(loader.loaded())
}
