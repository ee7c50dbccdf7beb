// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native WebP encoding via the `cwebp` command-line tool.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use imgpress_core::{ImageCodec, ImgpressError};

/// Codec that shells out to libwebp's `cwebp` binary.
///
/// Preferred over [`RasterCodec`](crate::RasterCodec) when present: the
/// native encoder is substantially faster on large images. Availability is
/// probed once at construction by searching the `PATH`.
pub struct CwebpCodec {
    binary: Option<PathBuf>,
}

impl CwebpCodec {
    /// Probe the `PATH` for a `cwebp` binary.
    pub fn new() -> Self {
        let binary = which::which("cwebp").ok();
        if let Some(path) = &binary {
            debug!(path = %path.display(), "found cwebp binary");
        }
        Self { binary }
    }

    /// Use a specific binary path (tests and non-PATH installs).
    pub fn with_binary(binary: PathBuf) -> Self {
        Self {
            binary: Some(binary),
        }
    }
}

impl Default for CwebpCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCodec for CwebpCodec {
    fn name(&self) -> &str {
        "cwebp"
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    async fn encode_webp(&self, source: &[u8], quality: u8) -> Result<Vec<u8>, ImgpressError> {
        let binary = self.binary.clone().ok_or_else(|| ImgpressError::Codec {
            message: "cwebp binary not found".to_string(),
        })?;

        // cwebp works on files; stage the source in a scratch directory that
        // cleans itself up on drop.
        let scratch = tempfile::tempdir().map_err(|e| ImgpressError::Codec {
            message: format!("cannot create scratch dir: {e}"),
        })?;
        let input = scratch.path().join("input.img");
        let output = scratch.path().join("output.webp");

        tokio::fs::write(&input, source)
            .await
            .map_err(|e| ImgpressError::Codec {
                message: format!("cannot stage source for cwebp: {e}"),
            })?;

        let result = Command::new(&binary)
            .arg("-quiet")
            .arg("-q")
            .arg(quality.to_string())
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output()
            .await
            .map_err(|e| ImgpressError::Codec {
                message: format!("cwebp failed to spawn: {e}"),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ImgpressError::Codec {
                message: format!("cwebp exited with {}: {}", result.status, stderr.trim()),
            });
        }

        tokio::fs::read(&output)
            .await
            .map_err(|e| ImgpressError::Codec {
                message: format!("cwebp produced no readable output: {e}"),
            })
    }
}
