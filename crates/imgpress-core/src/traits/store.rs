// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for image metadata and the durable conversion queue.

use async_trait::async_trait;

use crate::error::ImgpressError;
use crate::types::{
    ConversionTransition, FailOutcome, ImageRecord, NewImage, Page, QueueEntry, RetryCriteria,
};

/// Persistence for image records and the conversion task queue.
///
/// Record mutations at conversion transition points go through
/// [`apply_transition`](ImageStore::apply_transition), which performs one
/// atomic whole-field-set update per transition -- readers never observe a
/// partially applied state change.
#[async_trait]
pub trait ImageStore: Send + Sync {
    // --- Image records ---

    /// Insert a new record with default conversion bookkeeping
    /// (status `pending`, zero attempts) and return it.
    async fn create_image(&self, new: &NewImage) -> Result<ImageRecord, ImgpressError>;

    /// Fetch a record by id, regardless of owner.
    async fn get_image(&self, id: &str) -> Result<Option<ImageRecord>, ImgpressError>;

    /// Fetch a record by id, scoped to an owner.
    async fn get_image_for_owner(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError>;

    /// Find an owner's record by content hash (the dedup lookup).
    async fn find_by_hash(
        &self,
        owner_id: &str,
        content_hash: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError>;

    /// List an owner's records, newest first.
    async fn list_images(
        &self,
        owner_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<ImageRecord>, ImgpressError>;

    /// Apply one conversion status transition as a single atomic update.
    async fn apply_transition(
        &self,
        id: &str,
        transition: &ConversionTransition,
    ) -> Result<(), ImgpressError>;

    /// Delete a record. Returns false when no record matched.
    async fn delete_image(&self, id: &str) -> Result<bool, ImgpressError>;

    // --- Retry sweep ---

    /// Select records eligible for a retry sweep, oldest failures first.
    async fn select_retry_candidates(
        &self,
        criteria: &RetryCriteria,
    ) -> Result<Vec<ImageRecord>, ImgpressError>;

    /// Reset a record for another conversion round: status `pending`,
    /// attempts 0, error and failed/permanently-failed timestamps cleared.
    async fn reset_for_retry(&self, id: &str) -> Result<(), ImgpressError>;

    // --- Conversion queue ---

    /// Enqueue a conversion task for the given image. Returns the entry id.
    async fn enqueue_conversion(&self, image_id: &str) -> Result<i64, ImgpressError>;

    /// Atomically claim the oldest runnable pending entry, or `None` when
    /// the queue has nothing due.
    async fn dequeue_conversion(&self) -> Result<Option<QueueEntry>, ImgpressError>;

    /// Acknowledge an entry as done (conversion reached a terminal outcome).
    async fn ack_conversion(&self, entry_id: i64) -> Result<(), ImgpressError>;

    /// Record a failed attempt. Reschedules with backoff while budget
    /// remains, otherwise marks the entry failed and reports exhaustion.
    async fn fail_conversion(
        &self,
        entry_id: i64,
        backoff_secs: &[u64],
    ) -> Result<FailOutcome, ImgpressError>;
}
