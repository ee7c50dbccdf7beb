// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imgpress doctor` command implementation.
//!
//! Runs diagnostic checks against the Imgpress environment to identify
//! configuration, storage, and codec problems before they surface as
//! failed conversions.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use imgpress_blob::LocalBlobStore;
use imgpress_config::ImgpressConfig;
use imgpress_core::BlobStore;
use imgpress_storage::Database;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `imgpress doctor` command. Returns true when any check failed.
pub async fn run_doctor(config: &ImgpressConfig, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(),
        check_database(&config.storage.database_path).await,
        check_blob_root(&config.blob.root).await,
        check_codec(),
    ];

    println!();
    println!("  imgpress doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    let symbol = "✓".green();
                    format!(
                        "    {symbol} {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "!".yellow();
                    format!(
                        "    {symbol} {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                } else {
                    format!(
                        "    [WARN] {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "✗".red();
                    format!(
                        "    {symbol} {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                } else {
                    format!(
                        "    [FAIL] {:<14} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!("  {}", "-".repeat(50));
    println!(
        "  {} check(s), {} warning(s), {} failure(s)",
        results.len(),
        warn_count,
        fail_count
    );
    println!();

    fail_count > 0
}

fn check_config() -> CheckResult {
    // Config already survived load_and_validate to get this far.
    CheckResult {
        name: "config".to_string(),
        status: CheckStatus::Pass,
        message: "loaded and validated".to_string(),
        duration: Duration::ZERO,
    }
}

async fn check_database(database_path: &str) -> CheckResult {
    let start = Instant::now();
    let result = async {
        let db = Database::open(database_path).await?;
        let count: i64 = db
            .connection()
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0)))
            .await
            .map_err(|e| imgpress_core::ImgpressError::Storage {
                source: Box::new(e),
            })?;
        db.close().await?;
        Ok::<i64, imgpress_core::ImgpressError>(count)
    }
    .await;

    match result {
        Ok(count) => CheckResult {
            name: "database".to_string(),
            status: CheckStatus::Pass,
            message: format!("{count} image record(s)"),
            duration: start.elapsed(),
        },
        Err(err) => CheckResult {
            name: "database".to_string(),
            status: CheckStatus::Fail,
            message: err.to_string(),
            duration: start.elapsed(),
        },
    }
}

async fn check_blob_root(root: &str) -> CheckResult {
    let start = Instant::now();
    let store = LocalBlobStore::new(root);
    let probe = ".imgpress-doctor-probe";
    let result = async {
        store.write(probe, b"probe").await?;
        store.read(probe).await?;
        store.delete(probe).await
    }
    .await;

    match result {
        Ok(()) => CheckResult {
            name: "blob root".to_string(),
            status: CheckStatus::Pass,
            message: format!("{root} is writable"),
            duration: start.elapsed(),
        },
        Err(err) => CheckResult {
            name: "blob root".to_string(),
            status: CheckStatus::Fail,
            message: err.to_string(),
            duration: start.elapsed(),
        },
    }
}

fn check_codec() -> CheckResult {
    let start = Instant::now();
    let candidates = imgpress_codec::default_candidates();
    let preferred_available = candidates
        .first()
        .map(|c| c.is_available())
        .unwrap_or(false);

    match imgpress_codec::select_codec(&candidates) {
        Ok(codec) if preferred_available => CheckResult {
            name: "codec".to_string(),
            status: CheckStatus::Pass,
            message: format!("using {}", codec.name()),
            duration: start.elapsed(),
        },
        Ok(codec) => CheckResult {
            name: "codec".to_string(),
            status: CheckStatus::Warn,
            message: format!("cwebp not found, falling back to {}", codec.name()),
            duration: start.elapsed(),
        },
        Err(err) => CheckResult {
            name: "codec".to_string(),
            status: CheckStatus::Fail,
            message: err.to_string(),
            duration: start.elapsed(),
        },
    }
}
