//! Link graph operations
//!
//! Directed, unweighted edges between records. Both ends are resolved by
//! exact key lookup when an edge is created; afterwards the edge is a
//! [`SlotHandle`] in the source record's link list.

use crate::error::{DataError, Result};

use super::{RecordTable, SlotHandle};

impl RecordTable {
    /// Add an edge `key -> target`. Parallel edges are rejected.
    pub fn set_link(&mut self, key: &str, target: &str) -> Result<()> {
        let (source, sink) = self.resolve_pair(key, target)?;
        let handle = self.handle(sink);

        let record = self
            .slot_mut(source)
            .and_then(|slot| slot.record_mut())
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;

        if record.links.iter().any(|link| link.index == sink) {
            return Err(DataError::AlreadyLinked {
                key: key.to_string(),
                target: target.to_string(),
            });
        }

        record.links.push(handle);
        Ok(())
    }

    /// Drop the first edge `key -> target`
    pub fn remove_link(&mut self, key: &str, target: &str) -> Result<()> {
        let (source, sink) = self.resolve_pair(key, target)?;

        let record = self
            .slot_mut(source)
            .and_then(|slot| slot.record_mut())
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;

        let position = record
            .links
            .iter()
            .position(|link| link.index == sink)
            .ok_or_else(|| DataError::LinkNotFound {
                key: key.to_string(),
                target: target.to_string(),
            })?;

        record.links.remove(position);
        Ok(())
    }

    /// Number of outgoing links of `key`
    pub fn link_count(&self, key: &str) -> Result<usize> {
        let index = self
            .find_exact(key)
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;
        Ok(self.record(index).map(|record| record.links.len()).unwrap_or(0))
    }

    /// Key of the record that link number `position` of `key` points at
    pub fn link_at(&self, key: &str, position: usize) -> Result<&str> {
        let handle = self.link_handle(key, position)?;
        self.resolve(handle)
            .map(|record| record.key.as_str())
            .ok_or(DataError::StaleLink {
                index: handle.index,
            })
    }

    fn link_handle(&self, key: &str, position: usize) -> Result<SlotHandle> {
        let record = self
            .find_exact(key)
            .and_then(|index| self.record(index))
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;

        record
            .links
            .get(position)
            .copied()
            .ok_or_else(|| DataError::LinkIndexOutOfRange {
                key: key.to_string(),
                index: position,
                count: record.links.len(),
            })
    }

    fn resolve_pair(&self, key: &str, target: &str) -> Result<(usize, usize)> {
        let source = self
            .find_exact(key)
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;
        let sink = self
            .find_exact(target)
            .ok_or_else(|| DataError::KeyNotFound(target.to_string()))?;
        Ok((source, sink))
    }

    /// Remove every reference to slot `index` from every link list.
    /// Returns the number of links dropped.
    pub(crate) fn strip_links_to(&mut self, index: usize) -> usize {
        let mut stripped = 0;
        for slot in self.slots_mut() {
            if let Some(record) = slot.record_mut() {
                let before = record.links.len();
                record.links.retain(|link| link.index != index);
                stripped += before - record.links.len();
            }
        }
        stripped
    }
}
