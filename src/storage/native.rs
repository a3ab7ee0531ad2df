//! Native database format
//!
//! ```text
//! l1vmgodata database
//! :water "H2O"
//! :link "1"
//! :link "4"
//! ```
//!
//! Every record line is followed by a link count line and that many link
//! lines holding raw slot indices. Hand-written files (settings files in
//! particular) may leave out the link block of a record with no links.

use std::io::{BufRead, Write};

use crate::error::{DataError, Result};
use crate::protocol::codec::split_key_value;
use crate::store::{Loader, RecordTable};

/// First line of every native file
pub const HEADER: &str = "l1vmgodata database";

const LINK_KEY: &str = "link";

/// One parsed record of a native file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEntry {
    pub key: String,
    pub value: String,

    /// Raw slot indices, as written
    pub links: Vec<usize>,
}

/// Write every occupied record in slot order
pub fn write<W: Write>(table: &RecordTable, out: &mut W) -> Result<usize> {
    writeln!(out, "{}", HEADER)?;

    let mut written = 0;
    for (_, record) in table.iter() {
        writeln!(out, ":{} \"{}\"", record.key, record.value)?;
        writeln!(out, ":{} \"{}\"", LINK_KEY, record.links.len())?;
        for link in &record.links {
            writeln!(out, ":{} \"{}\"", LINK_KEY, link.index)?;
        }
        written += 1;
    }
    Ok(written)
}

/// Stream `input` into `loader`
pub fn read<R: BufRead>(loader: &mut Loader<'_>, input: R) -> Result<usize> {
    for entry in entries(input) {
        let entry = entry?;
        loader.push(entry.key, entry.value, &entry.links)?;
    }
    Ok(loader.loaded())
}

/// Parse `input` into entries without touching a table
pub fn entries<R: BufRead>(input: R) -> NativeEntries<impl Iterator<Item = Result<String>>> {
    NativeEntries {
        lines: super::lines(input),
        header_checked: false,
        pending: None,
        finished: false,
    }
}

/// Iterator over the records of a native file
pub struct NativeEntries<L> {
    lines: L,
    header_checked: bool,

    /// Line read ahead while looking for a link block
    pending: Option<String>,
    finished: bool,
}

impl<L: Iterator<Item = Result<String>>> NativeEntries<L> {
    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        for line in self.lines.by_ref() {
            let line = line?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn advance(&mut self) -> Result<Option<NativeEntry>> {
        if !self.header_checked {
            match self.next_line()? {
                Some(line) if line == HEADER => self.header_checked = true,
                Some(_) => return Err(DataError::syntax("not a l1vmgodata database")),
                None => return Ok(None),
            }
        }

        let line = match self.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let (key, value) = split_key_value(&line, '"')?;
        let mut entry = NativeEntry {
            key: key.to_string(),
            value: value.to_string(),
            links: Vec::new(),
        };

        let line = match self.next_line()? {
            Some(line) => line,
            None => return Ok(Some(entry)),
        };
        let link_count = match split_key_value(&line, '"') {
            Ok((LINK_KEY, count)) => Some(parse_index(count)?),
            _ => None,
        };
        match link_count {
            Some(count) => {
                for _ in 0..count {
                    let line = self
                        .next_line()?
                        .ok_or_else(|| DataError::syntax("truncated link list"))?;
                    match split_key_value(&line, '"')? {
                        (LINK_KEY, index) => entry.links.push(parse_index(index)?),
                        (other, _) => {
                            return Err(DataError::syntax(format!(
                                "expected link line, found :{}",
                                other
                            )))
                        }
                    }
                }
            }
            // No link block: the line belongs to the next record
            None => self.pending = Some(line),
        }

        Ok(Some(entry))
    }
}

impl<L: Iterator<Item = Result<String>>> Iterator for NativeEntries<L> {
    type Item = Result<NativeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.advance().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

fn parse_index(text: &str) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| DataError::syntax(format!("invalid link number: {}", text)))
}
