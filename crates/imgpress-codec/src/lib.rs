// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebP encoding backends for the Imgpress image conversion service.
//!
//! Two implementations of [`ImageCodec`](imgpress_core::ImageCodec):
//! [`CwebpCodec`] shells out to a native `cwebp` binary when one is on the
//! `PATH`; [`RasterCodec`] is the pure-Rust baseline (`image` decode +
//! `webp` lossy encode). [`select_codec`] probes an ordered candidate list
//! at startup and picks the first available one -- an environment with no
//! available candidate is a startup failure, not a per-image error.

use std::sync::Arc;

use tracing::{info, warn};

use imgpress_core::{ImageCodec, ImgpressError};

pub mod cwebp;
pub mod raster;

pub use cwebp::CwebpCodec;
pub use raster::RasterCodec;

/// The default candidate list, in preference order: native `cwebp` first,
/// pure-Rust raster fallback second.
pub fn default_candidates() -> Vec<Arc<dyn ImageCodec>> {
    vec![Arc::new(CwebpCodec::new()), Arc::new(RasterCodec)]
}

/// Probe candidates in order and select the first available codec.
///
/// Returns [`ImgpressError::NoCodecAvailable`] when the list is exhausted.
pub fn select_codec(
    candidates: &[Arc<dyn ImageCodec>],
) -> Result<Arc<dyn ImageCodec>, ImgpressError> {
    for candidate in candidates {
        if candidate.is_available() {
            info!(codec = candidate.name(), "image codec selected");
            return Ok(Arc::clone(candidate));
        }
        warn!(codec = candidate.name(), "codec unavailable, trying next candidate");
    }
    Err(ImgpressError::NoCodecAvailable)
}
