//! Tests for ConfigError display and conversions

use baton_config::ConfigError;
use std::io;
use std::path::PathBuf;

#[test]
fn test_io_error_display() {
    let err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
    let display = err.to_string();
    assert!(display.contains("CONFIG IO ERROR"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_json_error_display() {
    let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
    let err: ConfigError = json_err.into();
    assert!(err.to_string().contains("CONFIG PARSE ERROR"));
}

#[test]
fn test_not_found_error_display() {
    let err = ConfigError::NotFound(PathBuf::from("/some/path"));
    let display = err.to_string();
    assert!(display.contains("CONFIG NOT FOUND"));
    assert!(display.contains("/some/path"));
}

#[test]
fn test_io_error_from() {
    let err: ConfigError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
    assert!(matches!(err, ConfigError::Io(_)));
}
