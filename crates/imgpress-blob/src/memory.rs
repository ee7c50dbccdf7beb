// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory blob store.
//!
//! Used by tests (and ephemeral deployments) in place of the filesystem.
//! Tracks write counts so tests can assert that dedup prevented a second
//! physical write.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use imgpress_core::{BlobStore, ImgpressError};

use crate::path::validate;

/// Blob store keeping everything in a process-local map.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<u64>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations performed since construction.
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().unwrap()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, ImgpressError> {
        validate(path)?;
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ImgpressError> {
        validate(path)?;
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ImgpressError::Blob {
                message: format!("no blob at `{path}`"),
                source: None,
            })
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ImgpressError> {
        validate(path)?;
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ImgpressError> {
        validate(path)?;
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }

    async fn size(&self, path: &str) -> Result<u64, ImgpressError> {
        validate(path)?;
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .map(|b| b.len() as u64)
            .ok_or_else(|| ImgpressError::Blob {
                message: format!("no blob at `{path}`"),
                source: None,
            })
    }
}
