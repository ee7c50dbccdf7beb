// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure injection around a real store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use imgpress_core::types::{
    ConversionTransition, FailOutcome, ImageRecord, NewImage, Page, QueueEntry, RetryCriteria,
};
use imgpress_core::{ImageStore, ImgpressError};

/// Store wrapper that fails `enqueue_conversion` for chosen image ids.
///
/// Everything else delegates to the wrapped store. Used to verify the
/// sweeper's partial-failure semantics.
pub struct FlakyStore {
    inner: Arc<dyn ImageStore>,
    enqueue_failures: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn ImageStore>) -> Self {
        Self {
            inner,
            enqueue_failures: Mutex::new(HashSet::new()),
        }
    }

    /// Make `enqueue_conversion` fail for the given image id.
    pub fn fail_enqueue_for(&self, image_id: &str) {
        self.enqueue_failures
            .lock()
            .unwrap()
            .insert(image_id.to_string());
    }
}

#[async_trait]
impl ImageStore for FlakyStore {
    async fn create_image(&self, new: &NewImage) -> Result<ImageRecord, ImgpressError> {
        self.inner.create_image(new).await
    }

    async fn get_image(&self, id: &str) -> Result<Option<ImageRecord>, ImgpressError> {
        self.inner.get_image(id).await
    }

    async fn get_image_for_owner(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError> {
        self.inner.get_image_for_owner(id, owner_id).await
    }

    async fn find_by_hash(
        &self,
        owner_id: &str,
        content_hash: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError> {
        self.inner.find_by_hash(owner_id, content_hash).await
    }

    async fn list_images(
        &self,
        owner_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<ImageRecord>, ImgpressError> {
        self.inner.list_images(owner_id, page, per_page).await
    }

    async fn apply_transition(
        &self,
        id: &str,
        transition: &ConversionTransition,
    ) -> Result<(), ImgpressError> {
        self.inner.apply_transition(id, transition).await
    }

    async fn delete_image(&self, id: &str) -> Result<bool, ImgpressError> {
        self.inner.delete_image(id).await
    }

    async fn select_retry_candidates(
        &self,
        criteria: &RetryCriteria,
    ) -> Result<Vec<ImageRecord>, ImgpressError> {
        self.inner.select_retry_candidates(criteria).await
    }

    async fn reset_for_retry(&self, id: &str) -> Result<(), ImgpressError> {
        self.inner.reset_for_retry(id).await
    }

    async fn enqueue_conversion(&self, image_id: &str) -> Result<i64, ImgpressError> {
        if self.enqueue_failures.lock().unwrap().contains(image_id) {
            return Err(ImgpressError::Internal(format!(
                "injected enqueue failure for `{image_id}`"
            )));
        }
        self.inner.enqueue_conversion(image_id).await
    }

    async fn dequeue_conversion(&self) -> Result<Option<QueueEntry>, ImgpressError> {
        self.inner.dequeue_conversion().await
    }

    async fn ack_conversion(&self, entry_id: i64) -> Result<(), ImgpressError> {
        self.inner.ack_conversion(entry_id).await
    }

    async fn fail_conversion(
        &self,
        entry_id: i64,
        backoff_secs: &[u64],
    ) -> Result<FailOutcome, ImgpressError> {
        self.inner.fail_conversion(entry_id, backoff_secs).await
    }
}
