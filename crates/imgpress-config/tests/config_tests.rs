// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Imgpress configuration system.

use imgpress_config::diagnostic::{ConfigError, suggest_key};
use imgpress_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_imgpress_config() {
    let toml = r#"
[service]
log_level = "debug"

[storage]
database_path = "/tmp/imgpress-test.db"

[blob]
root = "/tmp/imgpress-blobs"

[upload]
max_size_bytes = 1048576
allowed_mime = ["image/jpeg"]

[conversion]
workers = 2
max_attempts = 5
backoff_secs = [10, 20]
timeout_secs = 60
poll_interval_secs = 2

[retry]
schedule = "15 * * * *"
hours = 48
limit = 25

[gateway]
bind_address = "0.0.0.0"
port = 9090
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/imgpress-test.db");
    assert_eq!(config.blob.root, "/tmp/imgpress-blobs");
    assert_eq!(config.upload.max_size_bytes, 1048576);
    assert_eq!(config.upload.allowed_mime, vec!["image/jpeg"]);
    assert_eq!(config.conversion.workers, 2);
    assert_eq!(config.conversion.max_attempts, 5);
    assert_eq!(config.conversion.backoff_secs, vec![10, 20]);
    assert_eq!(config.conversion.timeout_secs, 60);
    assert_eq!(config.retry.schedule, "15 * * * *");
    assert_eq!(config.retry.hours, 48);
    assert_eq!(config.retry.limit, 25);
    assert_eq!(config.gateway.bind_address, "0.0.0.0");
    assert_eq!(config.gateway.port, 9090);
}

/// Empty TOML falls back entirely to compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.upload.max_size_bytes, 5 * 1024 * 1024);
    assert_eq!(config.conversion.max_attempts, 3);
    assert_eq!(config.conversion.backoff_secs, vec![60, 300, 900]);
    assert_eq!(config.retry.schedule, "0 * * * *");
}

/// Unknown field in [retry] section is rejected.
#[test]
fn unknown_field_in_retry_produces_error() {
    let toml = r#"
[retry]
shedule = "0 * * * *"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("shedule"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown field surfaces as an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_diagnostic_carries_suggestion() {
    let toml = r#"
[conversion]
max_atempts = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce diagnostics");
    let unknown = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    let (key, suggestion) = unknown.expect("expected an UnknownKey diagnostic");
    assert_eq!(key, "max_atempts");
    assert_eq!(suggestion.as_deref(), Some("max_attempts"));
}

/// Semantic validation failures surface through load_and_validate_str.
#[test]
fn invalid_cron_schedule_fails_validation() {
    let toml = r#"
[retry]
schedule = "whenever"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { .. })),
        "expected a validation error"
    );
}

/// Wrong value type is rejected with an InvalidType-style error.
#[test]
fn wrong_type_for_port_produces_error() {
    let toml = r#"
[gateway]
port = "eighty"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// The fuzzy matcher behaves on domain key sets.
#[test]
fn suggest_key_matches_close_typos_only() {
    let valid = &["workers", "max_attempts", "backoff_secs", "timeout_secs"];
    assert_eq!(suggest_key("wokers", valid), Some("workers".to_string()));
    assert_eq!(suggest_key("qqqqq", valid), None);
}
