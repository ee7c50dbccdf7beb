// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem blob store.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use imgpress_core::{BlobStore, ImgpressError};

use crate::path::validate;

/// Blob store backed by a directory tree under a single root.
///
/// Keys map directly to paths below the root; parent directories are created
/// on write. The root itself is created lazily on first write.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`. No filesystem access happens here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, ImgpressError> {
        validate(key)?;
        Ok(self.root.join(key))
    }
}

fn io_err(message: impl Into<String>, err: std::io::Error) -> ImgpressError {
    ImgpressError::Blob {
        message: message.into(),
        source: Some(Box::new(err)),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, ImgpressError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full)
            .await
            .map_err(|e| io_err(format!("cannot stat `{path}`"), e))?)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ImgpressError> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .await
            .map_err(|e| io_err(format!("cannot read `{path}`"), e))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ImgpressError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(format!("cannot create parent dirs for `{path}`"), e))?;
        }
        fs::write(&full, bytes)
            .await
            .map_err(|e| io_err(format!("cannot write `{path}`"), e))?;
        debug!(path, bytes = bytes.len(), "blob written");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ImgpressError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            // Deleting a missing blob is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(format!("cannot delete `{path}`"), e)),
        }
    }

    async fn size(&self, path: &str) -> Result<u64, ImgpressError> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_err(format!("cannot stat `{path}`"), e))?;
        Ok(meta.len())
    }
}
