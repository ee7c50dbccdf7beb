// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a temp SQLite store to an in-memory blob store.
//!
//! Pipeline components are constructed by the tests themselves -- the
//! harness only owns the stateful backends, so crates below the pipeline
//! can reuse it without a dependency cycle.

use std::sync::Arc;

use imgpress_blob::MemoryBlobStore;
use imgpress_config::model::StorageConfig;
use imgpress_core::ImgpressError;
use imgpress_storage::SqliteStore;

/// Temp-backed storage pair for integration tests.
///
/// The SQLite database lives in a temp directory that is removed when the
/// harness drops.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub blobs: Arc<MemoryBlobStore>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a harness with the default attempt budget of 3.
    pub async fn new() -> Result<Self, ImgpressError> {
        Self::with_max_attempts(3).await
    }

    /// Create a harness whose queue entries carry a custom attempt budget.
    pub async fn with_max_attempts(max_attempts: i32) -> Result<Self, ImgpressError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ImgpressError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("imgpress-test.db");

        let store = SqliteStore::new(
            StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
            },
            max_attempts,
        );
        store.initialize().await?;

        Ok(Self {
            store: Arc::new(store),
            blobs: Arc::new(MemoryBlobStore::new()),
            _temp_dir: temp_dir,
        })
    }
}
