//! Config file loading integration tests.
//!
//! Verifies that JSON5 config files load with the documented defaults
//! and that bad files are rejected.

use std::path::Path;
use tempfile::TempDir;
use wxbridge_core::config::{Config, DriverKind};

#[test]
fn test_config_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wxbridge.json5");
    std::fs::write(
        &path,
        r#"{
            // Local development overrides
            server: { host: "127.0.0.1", port: 9000 },
            driver: { kind: "dry-run" },
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.driver.kind, DriverKind::DryRun);
    // Unspecified fields keep their defaults
    assert_eq!(config.driver.timeout_secs, 30);
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 25007);
    assert_eq!(config.driver.kind, DriverKind::Http);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/wxbridge.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json5 {{{").is_err());
}

#[test]
fn test_config_rejects_bad_agent_url() {
    let config = Config::parse(r#"{ driver: { agent_url: "not-a-url" } }"#).unwrap();
    assert!(config.validate().is_err());
}
