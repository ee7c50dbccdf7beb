// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Imgpress service.

use thiserror::Error;

/// The primary error type used across all Imgpress traits and core operations.
#[derive(Debug, Error)]
pub enum ImgpressError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Record store errors (database connection, query failure, constraint violations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Blob store errors (missing file, read/write failure, path escapes the root).
    #[error("blob error: {message}")]
    Blob {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Per-image codec errors (decode failure, encode failure, truncated output).
    /// Retryable: the record is marked `failed` and the substrate reschedules.
    #[error("codec error: {message}")]
    Codec { message: String },

    /// No image codec is available in this environment. A startup precondition
    /// failure, never a per-image error -- retrying individual images cannot help.
    #[error("no image codec available (tried all configured candidates)")]
    NoCodecAvailable,

    /// Upload validation failures (unsupported mime type, size over the cap).
    #[error("invalid upload: {message}")]
    InvalidUpload { message: String },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
