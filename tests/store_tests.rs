//! Tests for RecordTable
//!
//! These tests verify:
//! - Upsert vs blind insert semantics
//! - Exact and pattern lookups by key and value
//! - Remove and slot reuse
//! - Usage reporting
//! - Growth when the table is full, and the growth ceiling

use l1data::error::DataError;
use l1data::store::{RecordTable, Usage};
use regex::Regex;

// =============================================================================
// Helper Functions
// =============================================================================

fn table_with(entries: &[(&str, &str)]) -> RecordTable {
    let mut table = RecordTable::new(16);
    for (key, value) in entries {
        table.store(key, value).unwrap();
    }
    table
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_store_then_lookup() {
    let table = table_with(&[("water", "H2O"), ("iron", "Fe")]);

    assert_eq!(table.lookup_key("water").unwrap(), "H2O");
    assert_eq!(table.lookup_key("iron").unwrap(), "Fe");
}

#[test]
fn test_store_overwrites_in_place() {
    let mut table = table_with(&[("water", "H2O")]);
    let first = table.find_exact("water").unwrap();

    let index = table.store("water", "dihydrogen monoxide").unwrap();

    assert_eq!(index, first);
    assert_eq!(table.lookup_key("water").unwrap(), "dihydrogen monoxide");
    assert_eq!(table.usage().used, 1);
}

#[test]
fn test_store_fast_creates_duplicate() {
    let mut table = table_with(&[("water", "H2O")]);

    table.store_fast("water", "ice").unwrap();

    assert_eq!(table.usage().used, 2);
    // First match wins
    assert_eq!(table.lookup_key("water").unwrap(), "H2O");
}

#[test]
fn test_store_takes_first_free_slot() {
    let mut table = table_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
    table.remove("b").unwrap();

    let index = table.store("d", "4").unwrap();

    assert_eq!(index, 1);
    assert_eq!(table.fill_position(), 3);
}

#[test]
fn test_store_rejects_bad_entries() {
    let mut table = RecordTable::new(4);

    assert!(matches!(table.store("", "v"), Err(DataError::Syntax(_))));
    assert!(matches!(table.store("two words", "v"), Err(DataError::Syntax(_))));
    assert!(matches!(table.store("k", "say \"hi\""), Err(DataError::Syntax(_))));
    assert!(matches!(table.store_fast("k", "line\nbreak"), Err(DataError::Syntax(_))));
    assert_eq!(table.usage().used, 0);
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_lookup_missing_key() {
    let table = table_with(&[("water", "H2O")]);

    let err = table.lookup_key("fire").unwrap_err();
    assert!(matches!(err, DataError::KeyNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_lookup_exact_does_not_match_substring() {
    let table = table_with(&[("waterfall", "Niagara")]);

    assert!(table.lookup_key("water").is_err());
}

#[test]
fn test_lookup_by_value() {
    let table = table_with(&[("water", "H2O"), ("salt", "NaCl")]);

    assert_eq!(table.lookup_value("NaCl").unwrap(), "salt");
    assert!(matches!(table.lookup_value("KCl"), Err(DataError::ValueNotFound(_))));
}

#[test]
fn test_lookup_key_matching() {
    let table = table_with(&[("water", "H2O"), ("waterfall", "Niagara")]);

    let pattern = Regex::new("fall$").unwrap();
    assert_eq!(table.lookup_key_matching(&pattern).unwrap(), "Niagara");

    // Unanchored: first record in slot order containing a match
    let pattern = Regex::new("wat").unwrap();
    assert_eq!(table.lookup_key_matching(&pattern).unwrap(), "H2O");
}

#[test]
fn test_lookup_value_matching() {
    let table = table_with(&[("water", "H2O"), ("salt", "NaCl")]);

    let pattern = Regex::new("^Na").unwrap();
    assert_eq!(table.lookup_value_matching(&pattern).unwrap(), "salt");

    let pattern = Regex::new("^Fe").unwrap();
    assert!(table.lookup_value_matching(&pattern).is_err());
}

#[test]
fn test_lookup_skips_vacated_slots() {
    let mut table = table_with(&[("water", "H2O"), ("ice", "H2O")]);
    table.remove("water").unwrap();

    assert_eq!(table.lookup_value("H2O").unwrap(), "ice");
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_returns_value_once() {
    let mut table = table_with(&[("water", "H2O")]);

    assert_eq!(table.remove("water").unwrap(), "H2O");
    assert!(matches!(table.remove("water"), Err(DataError::KeyNotFound(_))));
}

#[test]
fn test_remove_keeps_other_indices() {
    let mut table = table_with(&[("a", "1"), ("b", "2"), ("c", "3")]);

    table.remove("a").unwrap();

    assert_eq!(table.find_exact("b"), Some(1));
    assert_eq!(table.find_exact("c"), Some(2));
    assert!(!table.slot(0).unwrap().is_occupied());
}

#[test]
fn test_remove_bumps_generation() {
    let mut table = table_with(&[("a", "1")]);
    let before = table.handle(0);

    table.remove("a").unwrap();
    table.store("b", "2").unwrap();

    assert!(table.resolve(before).is_none());
    assert_eq!(table.resolve(table.handle(0)).unwrap().key, "b");
}

#[test]
fn test_erase_all() {
    let mut table = table_with(&[("a", "1"), ("b", "2")]);
    table.set_link("a", "b").unwrap();

    table.erase_all();

    assert_eq!(table.usage().used, 0);
    assert_eq!(table.fill_position(), 0);
    assert!(table.lookup_key("a").is_err());
    assert_eq!(table.capacity(), 16);
}

// =============================================================================
// Usage Tests
// =============================================================================

#[test]
fn test_usage_report() {
    let mut table = RecordTable::new(8);
    table.store("a", "1").unwrap();
    table.store("b", "2").unwrap();
    table.store("c", "3").unwrap();

    let usage = table.usage();
    assert_eq!(usage, Usage { used: 3, capacity: 8 });
    assert_eq!(usage.to_string(), "USAGE 37.00% : 3 of 8");
}

#[test]
fn test_usage_empty_table() {
    let table = RecordTable::new(10);

    assert_eq!(table.usage().to_string(), "USAGE 0.00% : 0 of 10");
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_store_grows_full_table() {
    let mut table = RecordTable::new(4);
    for i in 0..4 {
        table.store(&format!("key{}", i), &format!("value{}", i)).unwrap();
    }
    table.set_link("key0", "key3").unwrap();

    let index = table.store("key4", "value4").unwrap();

    assert_eq!(index, 4);
    assert!(table.capacity() > 4);
    for i in 0..5 {
        assert_eq!(table.lookup_key(&format!("key{}", i)).unwrap(), format!("value{}", i));
    }
    assert_eq!(table.link_count("key0").unwrap(), 1);
    assert_eq!(table.link_at("key0", 0).unwrap(), "key3");
}

#[test]
fn test_grow_doubles_capacity() {
    let mut table = RecordTable::new(3);

    table.grow().unwrap();
    assert_eq!(table.capacity(), 6);

    table.grow().unwrap();
    assert_eq!(table.capacity(), 12);
}

#[test]
fn test_grow_respects_ceiling() {
    let mut table = RecordTable::with_max_capacity(2, Some(3));
    table.store("a", "1").unwrap();
    table.store("b", "2").unwrap();

    // 2 -> 3, capped
    table.store("c", "3").unwrap();
    assert_eq!(table.capacity(), 3);

    let err = table.store("d", "4").unwrap_err();
    assert!(matches!(err, DataError::CapacityExhausted { capacity: 3 }));
    assert!(table.lookup_key("d").is_err());
    assert_eq!(table.usage().used, 3);
}

#[test]
fn test_overwrite_in_full_table_does_not_grow() {
    let mut table = RecordTable::with_max_capacity(2, Some(2));
    table.store("a", "1").unwrap();
    table.store("b", "2").unwrap();

    table.store("a", "one").unwrap();

    assert_eq!(table.capacity(), 2);
    assert_eq!(table.lookup_key("a").unwrap(), "one");
}

// =============================================================================
// Loader Tests
// =============================================================================

#[test]
fn test_loader_starts_at_fill_position() {
    let mut table = table_with(&[("a", "1"), ("b", "2")]);
    table.remove("a").unwrap();

    let mut loader = table.loader();
    assert_eq!(loader.position(), 2);
    loader.push("c".to_string(), "3".to_string(), &[]).unwrap();
    assert_eq!(loader.loaded(), 1);

    assert_eq!(table.find_exact("c"), Some(2));
}

#[test]
fn test_loader_overflow_keeps_partial_progress() {
    let mut table = RecordTable::new(2);

    let mut loader = table.loader();
    loader.push("a".to_string(), "1".to_string(), &[]).unwrap();
    loader.push("b".to_string(), "2".to_string(), &[]).unwrap();
    let err = loader.push("c".to_string(), "3".to_string(), &[]).unwrap_err();

    assert!(matches!(err, DataError::Overflow { capacity: 2, loaded: 2 }));
    assert_eq!(table.lookup_key("a").unwrap(), "1");
    assert_eq!(table.lookup_key("b").unwrap(), "2");
}
