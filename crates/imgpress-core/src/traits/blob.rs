// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store trait for key-addressed image byte storage.

use async_trait::async_trait;

use crate::error::ImgpressError;

/// Key-addressed blob storage for image bytes.
///
/// Paths are relative keys like `images/42/image_1700000000_a1b2c3d4.jpg`;
/// the backend decides where they physically live. All operations are
/// asynchronous since backends may sit on slow disks or a network.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether a blob exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool, ImgpressError>;

    /// Read the full contents of a blob.
    async fn read(&self, path: &str) -> Result<Vec<u8>, ImgpressError>;

    /// Write a blob, creating parent directories as needed and replacing any
    /// existing blob at the same path.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ImgpressError>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<(), ImgpressError>;

    /// Size in bytes of the blob at the given path.
    async fn size(&self, path: &str) -> Result<u64, ImgpressError>;
}
