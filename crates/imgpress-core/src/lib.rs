// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Imgpress image conversion service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Imgpress workspace. Storage, blob, and
//! codec backends all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ImgpressError;
pub use types::{
    ConversionStatus, ConversionTransition, FailOutcome, ImageRecord, NewImage, Page, QueueEntry,
    RetryCriteria, RetryStatusFilter, clip_diagnostic,
};

// Re-export all backend traits at crate root.
pub use traits::{BlobStore, ImageCodec, ImageStore};
