//! Record and slot definitions

/// Identity of a slot at one point in its life.
///
/// `generation` is bumped every time the slot is vacated, so a handle taken
/// before a remove no longer matches once the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub index: usize,
    pub generation: u32,
}

/// An occupied slot's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,

    /// Outgoing links, in insertion order
    pub links: Vec<SlotHandle>,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            links: Vec::new(),
        }
    }
}

/// One position in the record table: either fully occupied or fully vacant
#[derive(Debug, Clone, Default)]
pub struct Slot {
    generation: u32,
    record: Option<Record>,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn record_mut(&mut self) -> Option<&mut Record> {
        self.record.as_mut()
    }

    pub(crate) fn occupy(&mut self, record: Record) {
        self.record = Some(record);
    }

    /// Empty the slot, returning what it held
    pub(crate) fn vacate(&mut self) -> Option<Record> {
        let record = self.record.take();
        if record.is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        record
    }
}
