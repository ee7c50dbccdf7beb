// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, cron expressions, and
//! non-empty backoff schedules.

use std::str::FromStr;

use croner::Cron;

use crate::diagnostic::ConfigError;
use crate::model::ImgpressConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ImgpressConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.blob.root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "blob.root must not be empty".to_string(),
        });
    }

    if config.upload.max_size_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "upload.max_size_bytes must be greater than zero".to_string(),
        });
    }

    if config.upload.allowed_mime.is_empty() {
        errors.push(ConfigError::Validation {
            message: "upload.allowed_mime must list at least one MIME type".to_string(),
        });
    }

    if config.conversion.workers == 0 {
        errors.push(ConfigError::Validation {
            message: "conversion.workers must be at least 1".to_string(),
        });
    }

    if config.conversion.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "conversion.max_attempts must be at least 1, got {}",
                config.conversion.max_attempts
            ),
        });
    }

    if config.conversion.backoff_secs.is_empty() {
        errors.push(ConfigError::Validation {
            message: "conversion.backoff_secs must not be empty".to_string(),
        });
    }

    if config.conversion.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "conversion.timeout_secs must be greater than zero".to_string(),
        });
    }

    if let Err(e) = Cron::from_str(&config.retry.schedule) {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.schedule `{}` is not a valid cron expression: {e}",
                config.retry.schedule
            ),
        });
    }

    if config.retry.limit < 1 {
        errors.push(ConfigError::Validation {
            message: format!("retry.limit must be at least 1, got {}", config.retry.limit),
        });
    }

    // Validate bind_address looks like a valid IP or hostname
    let addr = config.gateway.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must be non-zero".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
