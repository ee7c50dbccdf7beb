// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store backends for the Imgpress image conversion service.
//!
//! Implementations of the [`BlobStore`](imgpress_core::BlobStore) trait:
//! [`LocalBlobStore`] persists blobs as files under a configured root
//! directory; [`MemoryBlobStore`] keeps them in a process-local map and is
//! used by tests and ephemeral deployments.

pub mod local;
pub mod memory;
mod path;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use path::validate as validate_path;
