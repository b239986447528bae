//! Configuration loading tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use visitor_core::config::{LedgerConfig, DEFAULT_DATA_FILE};

#[test]
fn defaults_point_at_local_data_file() {
    let config = LedgerConfig::default();
    assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    assert_eq!(config.log_filter, "info");
}

#[test]
fn partial_config_keeps_defaults_for_missing_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, r#"{ "data_file": "/srv/park/visitors.csv" }"#).unwrap();

    let config = LedgerConfig::load(&path).unwrap();
    assert_eq!(config.data_file, PathBuf::from("/srv/park/visitors.csv"));
    assert_eq!(config.log_filter, "info");
}

#[test]
fn missing_config_is_an_error_unless_optional() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    assert!(LedgerConfig::load(&path).is_err());
    assert_eq!(LedgerConfig::load_or_default(&path).unwrap(), LedgerConfig::default());
}

#[test]
fn malformed_config_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, "{ data_file: ").unwrap();

    let err = LedgerConfig::load(&path).unwrap_err().to_string();
    assert!(err.contains("ledger.json"), "unexpected error: {err}");
}
