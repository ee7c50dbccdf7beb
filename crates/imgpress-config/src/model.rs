// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Imgpress service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Imgpress configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImgpressConfig {
    /// Service-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Record store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Blob store settings.
    #[serde(default)]
    pub blob: BlobConfig,

    /// Upload validation settings.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Conversion worker and retry-substrate settings.
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Scheduled retry sweep settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "imgpress.db".to_string()
}

/// Blob store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlobConfig {
    /// Root directory under which all blobs are stored.
    #[serde(default = "default_blob_root")]
    pub root: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            root: default_blob_root(),
        }
    }
}

fn default_blob_root() -> String {
    "storage".to_string()
}

/// Upload validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Accepted MIME types.
    #[serde(default = "default_allowed_mime")]
    pub allowed_mime: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_mime: default_allowed_mime(),
        }
    }
}

fn default_max_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_mime() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string()]
}

/// Conversion worker pool and retry-substrate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Number of concurrent conversion workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempt budget per queue entry before it is abandoned.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Backoff delays (seconds) between attempts, indexed by failed-attempt
    /// count. The last entry repeats when attempts outnumber entries.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,

    /// Deadline for a single conversion execution, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Idle worker poll interval, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_max_attempts() -> i32 {
    3
}

fn default_backoff_secs() -> Vec<u64> {
    vec![60, 300, 900]
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    1
}

/// Scheduled retry sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Cron expression for the periodic sweep.
    #[serde(default = "default_retry_schedule")]
    pub schedule: String,

    /// Lookback window in hours for the scheduled sweep.
    #[serde(default = "default_retry_hours")]
    pub hours: i64,

    /// Maximum records rehabilitated per scheduled sweep.
    #[serde(default = "default_retry_limit")]
    pub limit: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            schedule: default_retry_schedule(),
            hours: default_retry_hours(),
            limit: default_retry_limit(),
        }
    }
}

fn default_retry_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_retry_hours() -> i64 {
    24
}

fn default_retry_limit() -> i64 {
    100
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address the gateway binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the gateway listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}
