// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retry sweeper: batch rehabilitation of failed/skipped conversions.
//!
//! Selection runs against the record store (status, time window, attempt
//! cap); each selected record is reset to `pending` and re-enqueued.
//! Per-record failures are logged and counted, never abort the batch.

use std::sync::Arc;

use tracing::{debug, error, info};

use imgpress_core::{ImageRecord, ImageStore, ImgpressError, RetryCriteria};

/// Result of one sweep run.
#[derive(Debug)]
pub struct SweepOutcome {
    /// Records matched by the selection query, oldest failures first.
    pub candidates: Vec<ImageRecord>,
    /// Records actually reset and re-enqueued (0 in dry-run mode).
    pub retried: u64,
    /// Whether this run was selection-only.
    pub dry_run: bool,
}

/// Rehabilitates stuck conversions on demand or on a schedule.
pub struct RetrySweeper {
    store: Arc<dyn ImageStore>,
}

impl RetrySweeper {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Run one sweep.
    ///
    /// In dry-run mode the selection is reported without any mutation.
    /// Otherwise each candidate is reset and re-enqueued; the outcome counts
    /// the records that actually made it back onto the queue.
    pub async fn sweep(
        &self,
        criteria: &RetryCriteria,
        dry_run: bool,
    ) -> Result<SweepOutcome, ImgpressError> {
        let candidates = self.store.select_retry_candidates(criteria).await?;
        info!(
            selected = candidates.len(),
            status = %criteria.status,
            hours = criteria.hours,
            force = criteria.force,
            dry_run,
            "retry sweep selection complete"
        );

        if dry_run {
            return Ok(SweepOutcome {
                candidates,
                retried: 0,
                dry_run: true,
            });
        }

        let mut retried = 0u64;
        for record in &candidates {
            match self.retry_one(record).await {
                Ok(()) => {
                    retried += 1;
                    debug!(image_id = %record.id, "requeued for conversion");
                }
                Err(err) => {
                    error!(
                        image_id = %record.id,
                        error = %err,
                        "failed to retry image conversion"
                    );
                }
            }
        }

        info!(selected = candidates.len(), retried, "retry sweep finished");
        Ok(SweepOutcome {
            candidates,
            retried,
            dry_run: false,
        })
    }

    async fn retry_one(&self, record: &ImageRecord) -> Result<(), ImgpressError> {
        self.store.reset_for_retry(&record.id).await?;
        self.store.enqueue_conversion(&record.id).await?;
        Ok(())
    }
}
