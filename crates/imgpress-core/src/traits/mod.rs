// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait definitions for the Imgpress service.
//!
//! All backends use `#[async_trait]` for dynamic dispatch compatibility;
//! implementations live in their own crates (`imgpress-storage`,
//! `imgpress-blob`, `imgpress-codec`).

pub mod blob;
pub mod codec;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use blob::BlobStore;
pub use codec::ImageCodec;
pub use store::ImageStore;
