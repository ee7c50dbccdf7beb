// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ImageStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use imgpress_config::model::StorageConfig;
use imgpress_core::types::{
    ConversionTransition, FailOutcome, ImageRecord, NewImage, Page, QueueEntry, RetryCriteria,
};
use imgpress_core::{ImageStore, ImgpressError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed image and queue store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`initialize`](SqliteStore::initialize).
pub struct SqliteStore {
    config: StorageConfig,
    queue_max_attempts: i32,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// `queue_max_attempts` is stamped onto every queue entry this store
    /// creates; the database connection is not opened until
    /// [`initialize`](SqliteStore::initialize) is called.
    pub fn new(config: StorageConfig, queue_max_attempts: i32) -> Self {
        Self {
            config,
            queue_max_attempts,
            db: OnceCell::new(),
        }
    }

    /// Open the database (running migrations) if not already open.
    pub async fn initialize(&self) -> Result<(), ImgpressError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| ImgpressError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL and close the store.
    pub async fn close(&self) -> Result<(), ImgpressError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    /// Returns the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ImgpressError> {
        self.db.get().ok_or_else(|| ImgpressError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ImageStore for SqliteStore {
    // --- Image records ---

    async fn create_image(&self, new: &NewImage) -> Result<ImageRecord, ImgpressError> {
        queries::images::create_image(self.db()?, new).await
    }

    async fn get_image(&self, id: &str) -> Result<Option<ImageRecord>, ImgpressError> {
        queries::images::get_image(self.db()?, id).await
    }

    async fn get_image_for_owner(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError> {
        queries::images::get_image_for_owner(self.db()?, id, owner_id).await
    }

    async fn find_by_hash(
        &self,
        owner_id: &str,
        content_hash: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError> {
        queries::images::find_by_hash(self.db()?, owner_id, content_hash).await
    }

    async fn list_images(
        &self,
        owner_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<ImageRecord>, ImgpressError> {
        queries::images::list_images(self.db()?, owner_id, page, per_page).await
    }

    async fn apply_transition(
        &self,
        id: &str,
        transition: &ConversionTransition,
    ) -> Result<(), ImgpressError> {
        queries::images::apply_transition(self.db()?, id, transition).await
    }

    async fn delete_image(&self, id: &str) -> Result<bool, ImgpressError> {
        queries::images::delete_image(self.db()?, id).await
    }

    // --- Retry sweep ---

    async fn select_retry_candidates(
        &self,
        criteria: &RetryCriteria,
    ) -> Result<Vec<ImageRecord>, ImgpressError> {
        queries::images::select_retry_candidates(self.db()?, criteria).await
    }

    async fn reset_for_retry(&self, id: &str) -> Result<(), ImgpressError> {
        queries::images::reset_for_retry(self.db()?, id).await
    }

    // --- Conversion queue ---

    async fn enqueue_conversion(&self, image_id: &str) -> Result<i64, ImgpressError> {
        queries::queue::enqueue(self.db()?, image_id, self.queue_max_attempts).await
    }

    async fn dequeue_conversion(&self) -> Result<Option<QueueEntry>, ImgpressError> {
        queries::queue::dequeue(self.db()?).await
    }

    async fn ack_conversion(&self, entry_id: i64) -> Result<(), ImgpressError> {
        queries::queue::ack(self.db()?, entry_id).await
    }

    async fn fail_conversion(
        &self,
        entry_id: i64,
        backoff_secs: &[u64],
    ) -> Result<FailOutcome, ImgpressError> {
        queries::queue::fail(self.db()?, entry_id, backoff_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()), 3);

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()), 3);

        store.initialize().await.unwrap();
        let result = store.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()), 3);

        let result = store.get_image("whatever").await;
        assert!(result.is_err(), "queries should fail before initialize");
    }

    #[tokio::test]
    async fn full_record_lifecycle_through_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()), 3);
        store.initialize().await.unwrap();

        let new = NewImage {
            owner_id: "owner-1".to_string(),
            path: "images/owner-1/image_1700000000_abcd1234.png".to_string(),
            original_name: "cat.png".to_string(),
            mime: "image/png".to_string(),
            size: 4096,
            content_hash: "deadbeef".to_string(),
        };
        let created = store.create_image(&new).await.unwrap();

        let by_hash = store.find_by_hash("owner-1", "deadbeef").await.unwrap();
        assert_eq!(by_hash.unwrap().id, created.id);

        let scoped = store
            .get_image_for_owner(&created.id, "someone-else")
            .await
            .unwrap();
        assert!(scoped.is_none());

        let entry_id = store.enqueue_conversion(&created.id).await.unwrap();
        let entry = store.dequeue_conversion().await.unwrap().unwrap();
        assert_eq!(entry.id, entry_id);
        assert_eq!(entry.image_id, created.id);
        assert_eq!(entry.max_attempts, 3);

        store.ack_conversion(entry_id).await.unwrap();
        assert!(store.dequeue_conversion().await.unwrap().is_none());

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_entries_carry_configured_max_attempts() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("attempts.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()), 5);
        store.initialize().await.unwrap();

        store.enqueue_conversion("img-1").await.unwrap();
        let entry = store.dequeue_conversion().await.unwrap().unwrap();
        assert_eq!(entry.max_attempts, 5);

        store.close().await.unwrap();
    }
}
