//! Protocol codec
//!
//! Token extraction for command lines and native file lines, plus the
//! line-based stream helpers.
//!
//! ## Token Rules
//! - key: text after the first `:` up to the next space (or end of line)
//! - value: text strictly between the two quote characters (`'` on the
//!   wire, `"` in native files)
//! - a line carrying both must have a `:`, exactly two quote characters,
//!   and the `:` before them; anything else is rejected before extraction

use std::io::{BufRead, Read, Write};

use crate::error::{DataError, Result};
use super::Response;

/// Longest accepted command line, excluding the newline
pub const MAX_LINE_LEN: usize = 4096;

/// Wire value quote
pub const WIRE_QUOTE: char = '\'';

// =============================================================================
// Token Extraction
// =============================================================================

/// Structural check for a line that carries both a key and a value
pub fn validate_frame(line: &str, quote: char) -> Result<()> {
    let colon = line
        .find(':')
        .ok_or_else(|| DataError::syntax("missing ':' before key"))?;

    let quotes: Vec<usize> = line.match_indices(quote).map(|(at, _)| at).collect();
    if quotes.len() != 2 {
        return Err(DataError::syntax(format!(
            "expected two {} characters, found {}",
            quote,
            quotes.len()
        )));
    }
    if colon > quotes[0] {
        return Err(DataError::syntax("':' must come before the quoted value"));
    }
    Ok(())
}

/// Key token: after the first `:` up to the next space
pub fn extract_key(line: &str) -> Result<&str> {
    let start = line
        .find(':')
        .ok_or_else(|| DataError::syntax("missing ':' before key"))?
        + 1;
    let rest = &line[start..];
    let key = match rest.find(' ') {
        Some(end) => &rest[..end],
        None => rest,
    };
    if key.is_empty() {
        return Err(DataError::syntax("empty key"));
    }
    Ok(key)
}

/// Value token: between exactly two `quote` characters
pub fn extract_value(line: &str, quote: char) -> Result<&str> {
    let mut quotes = line.match_indices(quote).map(|(at, _)| at);
    match (quotes.next(), quotes.next(), quotes.next()) {
        (Some(open), Some(close), None) => Ok(&line[open + quote.len_utf8()..close]),
        _ => Err(DataError::syntax(format!(
            "value must be enclosed in one pair of {} characters",
            quote
        ))),
    }
}

/// Key and value from one line, after the structural check
pub fn split_key_value(line: &str, quote: char) -> Result<(&str, &str)> {
    validate_frame(line, quote)?;
    Ok((extract_key(line)?, extract_value(line, quote)?))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one line, without its line terminator.
///
/// Returns `Ok(None)` at end of stream. A line longer than
/// [`MAX_LINE_LEN`] is a syntax error.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LEN {
        return Err(DataError::syntax(format!(
            "line longer than {} bytes",
            MAX_LINE_LEN
        )));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| DataError::syntax("line is not valid UTF-8"))
}

/// Write one line and flush
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(response.encode().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a reply line from a stream (client side)
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<String> {
    read_line(reader)?.ok_or_else(|| {
        DataError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before reply",
        ))
    })
}
