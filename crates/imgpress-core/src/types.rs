// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Imgpress workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum stored length (in characters) for free-text diagnostic fields
/// (`conversion_error`, `conversion_skip_reason`).
pub const MAX_DIAGNOSTIC_LEN: usize = 255;

/// Clip a diagnostic message to [`MAX_DIAGNOSTIC_LEN`] characters.
///
/// Operates on characters, not bytes, so multi-byte input never produces an
/// invalid boundary.
pub fn clip_diagnostic(message: &str) -> String {
    message.chars().take(MAX_DIAGNOSTIC_LEN).collect()
}

/// Lifecycle state of an image's WebP conversion.
///
/// `completed` and `already_converted` are absorbing; `failed`,
/// `permanently_failed`, and `skipped` can return to `pending` via a retry
/// reset. `processing` is transient while a worker holds the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    PermanentlyFailed,
    Skipped,
    AlreadyConverted,
}

/// One uploaded image and its conversion bookkeeping.
///
/// Mirrors the `images` table one-to-one. `path`, `mime`, and `size` always
/// describe the currently stored file and mutate together on a successful
/// conversion; `content_hash` is the digest of the original upload and never
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub owner_id: String,
    pub path: String,
    pub original_name: String,
    pub mime: String,
    pub size: i64,
    pub content_hash: String,
    pub conversion_status: ConversionStatus,
    pub conversion_attempts: i32,
    pub conversion_quality: Option<i32>,
    pub original_size: Option<i64>,
    pub compression_ratio: Option<f64>,
    pub converted_at: Option<DateTime<Utc>>,
    pub conversion_failed_at: Option<DateTime<Utc>>,
    pub conversion_skipped_at: Option<DateTime<Utc>>,
    pub conversion_permanently_failed_at: Option<DateTime<Utc>>,
    pub conversion_error: Option<String>,
    pub conversion_skip_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new image record at upload time.
///
/// Conversion bookkeeping starts at its defaults: status `pending`,
/// zero attempts, all terminal fields null.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub owner_id: String,
    pub path: String,
    pub original_name: String,
    pub mime: String,
    pub size: i64,
    pub content_hash: String,
}

/// One atomic status transition applied to an image record.
///
/// Every variant maps to a single whole-field-set `UPDATE`, so readers never
/// observe a partially applied transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionTransition {
    /// Worker picked the record up for execution.
    Processing,
    /// Conversion succeeded; the record now describes the WebP file.
    Completed {
        webp_path: String,
        new_size: i64,
        quality: i32,
        original_size: i64,
        compression_ratio: f64,
        attempts: i32,
    },
    /// Source file is already WebP; nothing to do, ever.
    AlreadyConverted { original_size: i64 },
    /// Conversion could not run (e.g. source blob missing). Soft: the
    /// sweeper may re-enqueue later. Leaves the attempt counter untouched.
    Skipped {
        reason: String,
        original_size: i64,
    },
    /// One execution failed; the substrate decides whether to reschedule.
    Failed {
        error: String,
        attempts: i32,
        original_size: i64,
    },
    /// The substrate exhausted the attempt budget.
    PermanentlyFailed,
}

/// One entry in the durable conversion queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub id: i64,
    pub image_id: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub available_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of recording a failed queue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailOutcome {
    /// Attempt count after the increment.
    pub attempts: i32,
    /// True when the attempt budget is spent and the entry will not run again.
    pub exhausted: bool,
}

/// Status filter accepted by the retry sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RetryStatusFilter {
    Failed,
    PermanentlyFailed,
    Skipped,
    /// The union {failed, permanently_failed, skipped}. Note: the time window
    /// only bounds failed/skipped timestamps in this mode.
    All,
}

/// Selection parameters for the retry sweep.
#[derive(Debug, Clone)]
pub struct RetryCriteria {
    /// Lookback window in hours; `0` disables the time filter.
    pub hours: i64,
    /// Maximum records selected per sweep.
    pub limit: i64,
    pub status: RetryStatusFilter,
    /// Include records that already spent their attempt budget.
    pub force: bool,
    /// Attempt cap applied when `force` is false.
    pub max_attempts: i32,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}
