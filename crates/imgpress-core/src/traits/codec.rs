// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image codec trait for WebP re-encoding.

use async_trait::async_trait;

use crate::error::ImgpressError;

/// A capability that decodes JPEG/PNG bytes and re-encodes them as WebP.
///
/// Candidates are probed in preference order at startup via
/// [`is_available`](ImageCodec::is_available); the first available codec
/// serves every conversion for the process lifetime. An environment with no
/// available candidate fails startup with
/// [`ImgpressError::NoCodecAvailable`].
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Short identifier used in logs and diagnostics (e.g. `cwebp`).
    fn name(&self) -> &str;

    /// Whether this codec can run in the current environment.
    fn is_available(&self) -> bool;

    /// Decode `source` (JPEG or PNG) and encode it as lossy WebP at the
    /// given quality (0-100).
    async fn encode_webp(&self, source: &[u8], quality: u8) -> Result<Vec<u8>, ImgpressError>;
}
