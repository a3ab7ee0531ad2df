//! Tests for the persistence formats
//!
//! These tests verify:
//! - Byte-exact output of every format
//! - Native round trips including link lists
//! - CSV-table pivot export and import
//! - Additive loads and overflow behaviour
//! - Settings files read through the native format

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use l1data::config::Config;
use l1data::error::DataError;
use l1data::storage::{self, csv, json, native, pivot, Format};
use l1data::store::RecordTable;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn chemistry() -> RecordTable {
    let mut table = RecordTable::new(8);
    table.store("water", "H2O").unwrap();
    table.store("iron", "Fe").unwrap();
    table.store("salt", "NaCl").unwrap();
    table
}

fn write_to_string(table: &RecordTable, format: Format) -> String {
    let mut out = Vec::new();
    match format {
        Format::Native => native::write(table, &mut out).unwrap(),
        Format::Json => json::write(table, &mut out).unwrap(),
        Format::Csv => csv::write(table, &mut out).unwrap(),
        Format::CsvTable => pivot::write(table, &mut out).unwrap(),
    };
    String::from_utf8(out).unwrap()
}

fn pivot_source() -> RecordTable {
    let mut table = RecordTable::new(16);
    let mut loader = table.loader();
    pivot::read(
        &mut loader,
        Cursor::new("substance, chemical, boiling\nwater, H2O, 100\niron, Fe, 3070\n"),
    )
    .unwrap();
    table
}

fn temp_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Native Format Tests
// =============================================================================

#[test]
fn test_native_output() {
    let mut table = chemistry();
    table.set_link("water", "salt").unwrap();

    assert_eq!(
        write_to_string(&table, Format::Native),
        "l1vmgodata database\n\
         :water \"H2O\"\n:link \"1\"\n:link \"2\"\n\
         :iron \"Fe\"\n:link \"0\"\n\
         :salt \"NaCl\"\n:link \"0\"\n"
    );
}

#[test]
fn test_native_round_trip_with_links() {
    let mut table = chemistry();
    table.set_link("water", "salt").unwrap();
    table.set_link("water", "iron").unwrap();
    table.set_link("salt", "water").unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chem.l1db");
    assert_eq!(storage::save(&table, Format::Native, &path).unwrap(), 3);

    let mut restored = RecordTable::new(8);
    assert_eq!(storage::load(&mut restored, Format::Native, &path).unwrap(), 3);

    for (index, record) in table.iter() {
        let copy = restored.record(index).unwrap();
        assert_eq!(copy.key, record.key);
        assert_eq!(copy.value, record.value);
        let links: Vec<usize> = copy.links.iter().map(|link| link.index).collect();
        let expected: Vec<usize> = record.links.iter().map(|link| link.index).collect();
        assert_eq!(links, expected);
    }
    assert_eq!(restored.link_at("water", 1).unwrap(), "iron");
    assert_eq!(restored.link_at("salt", 0).unwrap(), "water");
}

#[test]
fn test_native_reader_accepts_missing_link_block() {
    let input = "l1vmgodata database\n:host \"127.0.0.1\"\n:port \"2000\"\n:link \"0\"\n";
    let entries: Vec<_> = native::entries(Cursor::new(input))
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "host");
    assert_eq!(entries[0].value, "127.0.0.1");
    assert_eq!(entries[1].key, "port");
    assert!(entries[1].links.is_empty());
}

#[test]
fn test_native_reader_rejects_bad_header() {
    let mut table = RecordTable::new(4);
    let mut loader = table.loader();

    let err = native::read(&mut loader, Cursor::new("not a database\n:a \"1\"\n")).unwrap_err();
    assert!(matches!(err, DataError::Syntax(_)));
}

#[test]
fn test_native_reader_truncated_links() {
    let mut table = RecordTable::new(4);
    let mut loader = table.loader();

    let input = "l1vmgodata database\n:a \"1\"\n:link \"2\"\n:link \"0\"\n";
    assert!(matches!(native::read(&mut loader, Cursor::new(input)), Err(DataError::Syntax(_))));
}

// =============================================================================
// JSON Format Tests
// =============================================================================

#[test]
fn test_json_output() {
    let table = chemistry();

    assert_eq!(
        write_to_string(&table, Format::Json),
        "{ \"l1vmgodata database\" :[\n\
         { \"key\": \"water\", \"value\": \"H2O\" },\n\
         { \"key\": \"iron\", \"value\": \"Fe\" },\n\
         { \"key\": \"salt\", \"value\": \"NaCl\" }\n\
         ]\n}\n"
    );
}

#[test]
fn test_json_empty_table() {
    let table = RecordTable::new(2);

    assert_eq!(write_to_string(&table, Format::Json), "{ \"l1vmgodata database\" :[\n]\n}\n");
}

#[test]
fn test_json_import() {
    let mut table = RecordTable::new(8);
    let mut loader = table.loader();
    let loaded = json::read(&mut loader, Cursor::new(write_to_string(&chemistry(), Format::Json))).unwrap();

    assert_eq!(loaded, 3);
    assert_eq!(table.lookup_key("salt").unwrap(), "NaCl");
    assert_eq!(table.find_exact("water"), Some(0));
}

// =============================================================================
// CSV Format Tests
// =============================================================================

#[test]
fn test_csv_output() {
    assert_eq!(
        write_to_string(&chemistry(), Format::Csv),
        "key, value\nwater, H2O\niron, Fe\nsalt, NaCl\n"
    );
}

#[test]
fn test_csv_import_splits_at_first_comma() {
    let mut table = RecordTable::new(8);
    let mut loader = table.loader();
    csv::read(&mut loader, Cursor::new("key, value\nwater, H2O\nlist, a, b\n")).unwrap();

    assert_eq!(table.lookup_key("water").unwrap(), "H2O");
    assert_eq!(table.lookup_key("list").unwrap(), "a, b");
}

#[test]
fn test_csv_import_missing_comma() {
    let mut table = RecordTable::new(8);
    let mut loader = table.loader();

    let err = csv::read(&mut loader, Cursor::new("key, value\nwater H2O\n")).unwrap_err();
    assert!(matches!(err, DataError::Syntax(_)));
}

#[test]
fn test_csv_import_rejects_unstorable_key() {
    let mut table = RecordTable::new(8);
    let mut loader = table.loader();

    let err = csv::read(&mut loader, Cursor::new("key, value\nsea water, H2O\n")).unwrap_err();
    assert!(matches!(err, DataError::Syntax(_)));
    assert_eq!(table.usage().used, 0);
}

// =============================================================================
// CSV Table Tests
// =============================================================================

#[test]
fn test_pivot_import_composite_keys() {
    let table = pivot_source();

    assert_eq!(table.lookup_key("1-1-substance").unwrap(), "water");
    assert_eq!(table.lookup_key("1-2-chemical").unwrap(), "H2O");
    assert_eq!(table.lookup_key("1-3-boiling").unwrap(), "100");
    assert_eq!(table.lookup_key("2-1-substance").unwrap(), "iron");
    assert_eq!(table.lookup_key("2-2-chemical").unwrap(), "Fe");
    assert_eq!(table.lookup_key("2-3-boiling").unwrap(), "3070");
    assert_eq!(table.usage().used, 6);
}

#[test]
fn test_pivot_round_trip() {
    let table = pivot_source();
    let exported = write_to_string(&table, Format::CsvTable);

    assert_eq!(exported, "substance, chemical, boiling\nwater, H2O, 100\niron, Fe, 3070\n");

    let mut restored = RecordTable::new(16);
    let mut loader = restored.loader();
    pivot::read(&mut loader, Cursor::new(exported)).unwrap();
    for (_, record) in table.iter() {
        assert_eq!(restored.lookup_key(&record.key).unwrap(), record.value);
    }
}

#[test]
fn test_pivot_export_ignores_plain_keys() {
    let mut table = pivot_source();
    table.store("note", "unrelated").unwrap();

    assert_eq!(
        write_to_string(&table, Format::CsvTable),
        "substance, chemical, boiling\nwater, H2O, 100\niron, Fe, 3070\n"
    );
}

#[test]
fn test_pivot_export_empty_without_header() {
    assert_eq!(write_to_string(&chemistry(), Format::CsvTable), "");
}

#[test]
fn test_parse_composite() {
    assert_eq!(pivot::parse_composite("2-3-boiling"), Some((2, 3, "boiling")));
    assert_eq!(pivot::parse_composite("1-1-boiling-point"), Some((1, 1, "boiling-point")));
    assert_eq!(pivot::parse_composite("water"), None);
    assert_eq!(pivot::parse_composite("1-x-name"), None);
    assert_eq!(pivot::composite_key(1, 2, "chemical"), "1-2-chemical");
}

// =============================================================================
// Load Semantics Tests
// =============================================================================

#[test]
fn test_loads_are_additive() {
    let dir = TempDir::new().unwrap();
    let first = temp_file(&dir, "a.csv", "key, value\na, 1\nb, 2\n");
    let second = temp_file(&dir, "b.csv", "key, value\nc, 3\n");

    let mut table = RecordTable::new(8);
    storage::load(&mut table, Format::Csv, &first).unwrap();
    storage::load(&mut table, Format::Csv, &second).unwrap();

    assert_eq!(table.find_exact("a"), Some(0));
    assert_eq!(table.find_exact("c"), Some(2));
    assert_eq!(table.usage().used, 3);
}

#[test]
fn test_load_overflow_keeps_loaded_records() {
    let dir = TempDir::new().unwrap();
    let path = temp_file(&dir, "big.csv", "key, value\na, 1\nb, 2\nc, 3\nd, 4\n");

    let mut table = RecordTable::new(3);
    table.store("x", "0").unwrap();
    let err = storage::load(&mut table, Format::Csv, &path).unwrap_err();

    assert!(matches!(err, DataError::Overflow { capacity: 3, loaded: 2 }));
    assert_eq!(table.lookup_key("a").unwrap(), "1");
    assert_eq!(table.lookup_key("b").unwrap(), "2");
    assert!(table.lookup_key("c").is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let mut table = RecordTable::new(3);

    let err = storage::load(&mut table, Format::Json, &dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}

#[test]
fn test_every_format_saves_and_loads() {
    let dir = TempDir::new().unwrap();
    let table = chemistry();

    for format in [Format::Native, Format::Json, Format::Csv] {
        let path = dir.path().join(format!("{:?}", format));
        storage::save(&table, format, &path).unwrap();

        let mut restored = RecordTable::new(8);
        assert_eq!(storage::load(&mut restored, format, &path).unwrap(), 3, "{:?}", format);
        assert_eq!(restored.lookup_key("iron").unwrap(), "Fe", "{:?}", format);
    }
}

// =============================================================================
// Settings File Tests
// =============================================================================

#[test]
fn test_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = temp_file(
        &dir,
        "settings.l1db",
        "l1vmgodata database\n\
         :host \"0.0.0.0\"\n:link \"0\"\n\
         :port \"2020\"\n:link \"0\"\n\
         :database-root \"/var/lib/l1data\"\n:link \"0\"\n\
         :tls \"tls=on\"\n:link \"0\"\n\
         :capacity \"500\"\n:link \"0\"\n",
    );

    let config = Config::from_settings(&path).unwrap();

    assert_eq!(config.listen_addr(), "0.0.0.0:2020");
    assert_eq!(config.database_root, PathBuf::from("/var/lib/l1data"));
    assert_eq!(config.capacity, 500);
    assert!(config.require_auth);
}

#[test]
fn test_settings_defaults_and_auth_key() {
    let dir = TempDir::new().unwrap();
    let path = temp_file(&dir, "settings.l1db", "l1vmgodata database\n:auth \"on\"\n");

    let config = Config::from_settings(&path).unwrap();

    assert_eq!(config.port, 2000);
    assert!(config.require_auth);
}

#[test]
fn test_settings_invalid_port() {
    let dir = TempDir::new().unwrap();
    let path = temp_file(&dir, "settings.l1db", "l1vmgodata database\n:port \"http\"\n");

    assert!(matches!(Config::from_settings(&path), Err(DataError::Config(_))));
}

#[test]
fn test_settings_missing_file() {
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        Config::from_settings(&dir.path().join("absent.l1db")),
        Err(DataError::Config(_))
    ));
}
