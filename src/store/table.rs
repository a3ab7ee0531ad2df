//! Record table implementation
//!
//! Slot-vector table. Holds no lock of its own: the [`Engine`] wraps it in a
//! single mutex and every method here runs under that lock.
//!
//! [`Engine`]: crate::engine::Engine

use std::fmt;
use std::io::{BufReader, BufWriter, Write};

use regex::Regex;

use crate::error::{DataError, Result};
use crate::storage::native;

use super::{Record, Slot, SlotHandle};

/// Occupied-slot count against table capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub used: usize,
    pub capacity: usize,
}

impl Usage {
    /// Whole-number percentage (truncated), reported with two decimals
    pub fn percent(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (100 * self.used / self.capacity) as f64
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "USAGE {:.2}% : {} of {}",
            self.percent(),
            self.used,
            self.capacity
        )
    }
}

/// Fixed-capacity table of record slots
#[derive(Debug, Clone)]
pub struct RecordTable {
    slots: Vec<Slot>,

    /// Growth stops here; `None` means unbounded
    max_capacity: Option<usize>,
}

impl RecordTable {
    /// Create an empty table with `capacity` vacant slots
    pub fn new(capacity: usize) -> Self {
        Self::with_max_capacity(capacity, None)
    }

    /// Create an empty table whose growth is capped at `max_capacity`
    pub fn with_max_capacity(capacity: usize, max_capacity: Option<usize>) -> Self {
        Self {
            slots: vec![Slot::default(); capacity],
            max_capacity,
        }
    }

    // =========================================================================
    // Slot Access
    // =========================================================================

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.slots.get(index).and_then(Slot::record)
    }

    /// Occupied records in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.record().map(|record| (index, record)))
    }

    /// Handle for the slot at `index` as it is right now
    pub fn handle(&self, index: usize) -> SlotHandle {
        let generation = self.slots.get(index).map(Slot::generation).unwrap_or(0);
        SlotHandle { index, generation }
    }

    /// Record behind `handle`, if the slot still holds the same occupant
    pub fn resolve(&self, handle: SlotHandle) -> Option<&Record> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation() == handle.generation)
            .and_then(Slot::record)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    pub(crate) fn slots_mut(&mut self) -> std::slice::IterMut<'_, Slot> {
        self.slots.iter_mut()
    }

    /// Index of the first occupied slot whose key equals `key`
    pub fn find_exact(&self, key: &str) -> Option<usize> {
        self.iter()
            .find(|(_, record)| record.key == key)
            .map(|(index, _)| index)
    }

    /// One past the highest occupied slot; bulk loads start here
    pub fn fill_position(&self) -> usize {
        self.slots
            .iter()
            .rposition(Slot::is_occupied)
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.is_occupied())
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// UpsertOrInsert: overwrite the value of an existing key in place, or
    /// take the first free slot (growing the table if none is free)
    pub fn store(&mut self, key: &str, value: &str) -> Result<usize> {
        validate_entry(key, value)?;

        if let Some(index) = self.find_exact(key) {
            if let Some(record) = self.slots[index].record_mut() {
                record.value = value.to_string();
            }
            return Ok(index);
        }

        let index = self.allocate()?;
        self.slots[index].occupy(Record::new(key, value));
        Ok(index)
    }

    /// BlindInsert: take the first free slot without checking for the key.
    ///
    /// Skips the full scan, so a key stored twice this way occupies two
    /// slots; exact lookups and link resolution then see only the first.
    pub fn store_fast(&mut self, key: &str, value: &str) -> Result<usize> {
        validate_entry(key, value)?;

        let index = self.allocate()?;
        self.slots[index].occupy(Record::new(key, value));
        Ok(index)
    }

    fn allocate(&mut self) -> Result<usize> {
        if let Some(index) = self.first_free() {
            return Ok(index);
        }

        // A full table has no holes, so the first new slot is the old capacity
        let index = self.capacity();
        self.grow()?;
        Ok(index)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Value of the first record whose key equals `key`
    pub fn lookup_key(&self, key: &str) -> Result<&str> {
        self.iter()
            .find(|(_, record)| record.key == key)
            .map(|(_, record)| record.value.as_str())
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))
    }

    /// Value of the first record whose key matches `pattern`
    pub fn lookup_key_matching(&self, pattern: &Regex) -> Result<&str> {
        self.iter()
            .find(|(_, record)| pattern.is_match(&record.key))
            .map(|(_, record)| record.value.as_str())
            .ok_or_else(|| DataError::KeyNotFound(pattern.as_str().to_string()))
    }

    /// Key of the first record whose value equals `value`
    pub fn lookup_value(&self, value: &str) -> Result<&str> {
        self.iter()
            .find(|(_, record)| record.value == value)
            .map(|(_, record)| record.key.as_str())
            .ok_or_else(|| DataError::ValueNotFound(value.to_string()))
    }

    /// Key of the first record whose value matches `pattern`
    pub fn lookup_value_matching(&self, pattern: &Regex) -> Result<&str> {
        self.iter()
            .find(|(_, record)| pattern.is_match(&record.value))
            .map(|(_, record)| record.key.as_str())
            .ok_or_else(|| DataError::ValueNotFound(pattern.as_str().to_string()))
    }

    // =========================================================================
    // Remove
    // =========================================================================

    /// Remove the record stored under `key` and return its value.
    ///
    /// Every link list in the table is swept for references to the slot
    /// before it is vacated.
    pub fn remove(&mut self, key: &str) -> Result<String> {
        let index = self
            .find_exact(key)
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;

        let stripped = self.strip_links_to(index);
        if stripped > 0 {
            tracing::debug!("remove {}: dropped {} incoming links", key, stripped);
        }

        self.slots[index]
            .vacate()
            .map(|record| record.value)
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))
    }

    /// Vacate every slot and drop every link
    pub fn erase_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.vacate();
        }
    }

    // =========================================================================
    // Usage / Growth
    // =========================================================================

    pub fn usage(&self) -> Usage {
        Usage {
            used: self.slots.iter().filter(|slot| slot.is_occupied()).count(),
            capacity: self.capacity(),
        }
    }

    fn next_capacity(&self) -> Option<usize> {
        let capacity = self.capacity();
        let doubled = capacity.saturating_mul(2).max(capacity + 1);
        match self.max_capacity {
            Some(max) if capacity >= max => None,
            Some(max) => Some(doubled.min(max)),
            None => Some(doubled),
        }
    }

    /// Replace the table with a larger one.
    ///
    /// The contents go through a scratch file in the native format and are
    /// reloaded into the new table. Every record returns to the slot it came
    /// from, so vacated slots stay vacant and link indices stay valid.
    pub fn grow(&mut self) -> Result<()> {
        let capacity = self.capacity();
        let target = self
            .next_capacity()
            .ok_or(DataError::CapacityExhausted { capacity })?;

        let mut scratch = tempfile::NamedTempFile::new()?;
        {
            let mut out = BufWriter::new(scratch.as_file_mut());
            native::write(self, &mut out)?;
            out.flush()?;
        }

        // The scratch file lists records in slot order
        let origins: Vec<usize> = self.iter().map(|(index, _)| index).collect();
        let entries = native::entries(BufReader::new(scratch.reopen()?));

        let mut grown = RecordTable::with_max_capacity(target, self.max_capacity);
        for (index, entry) in origins.into_iter().zip(entries) {
            let entry = entry?;
            grown.place(index, entry.key, entry.value, &entry.links);
        }

        tracing::info!("record table grown from {} to {} slots", capacity, target);
        *self = grown;
        Ok(())
    }

    /// Occupy slot `index`; `links` are raw slot indices
    fn place(&mut self, index: usize, key: String, value: String, links: &[usize]) {
        let links = links.iter().map(|&target| self.handle(target)).collect();
        if let Some(slot) = self.slots.get_mut(index) {
            slot.occupy(Record { key, value, links });
        }
    }

    // =========================================================================
    // Bulk Load
    // =========================================================================

    /// Start an additive bulk load at the current fill position
    pub fn loader(&mut self) -> Loader<'_> {
        let next = self.fill_position();
        Loader {
            table: self,
            next,
            loaded: 0,
        }
    }
}

/// Sequential writer used by every load path.
///
/// Places records one after another from the fill position onwards. Hitting
/// the end of the table is an `Overflow`; records placed before that stay.
pub struct Loader<'a> {
    table: &'a mut RecordTable,
    next: usize,
    loaded: usize,
}

impl Loader<'_> {
    /// Place one record; `links` are raw slot indices
    pub fn push(&mut self, key: String, value: String, links: &[usize]) -> Result<usize> {
        validate_entry(&key, &value)?;

        let capacity = self.table.capacity();
        if self.next >= capacity {
            tracing::warn!("load overflow after {} records at {} slots", self.loaded, capacity);
            return Err(DataError::Overflow {
                capacity,
                loaded: self.loaded,
            });
        }

        let index = self.next;
        self.table.place(index, key, value, links);

        self.next += 1;
        self.loaded += 1;
        Ok(index)
    }

    /// Records placed so far
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Slot the next record goes into
    pub fn position(&self) -> usize {
        self.next
    }
}

/// Keys and values must survive a write in the native format, whichever
/// path they arrive by
fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(DataError::syntax("empty key"));
    }
    if key.chars().any(|c| c.is_whitespace() || c == '"') {
        return Err(DataError::syntax(format!("invalid key: {}", key)));
    }
    if value.contains(['"', '\n', '\r']) {
        return Err(DataError::syntax("value contains a double quote or line break"));
    }
    Ok(())
}
