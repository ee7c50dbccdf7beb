// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversion job: one image, one execution, one terminal outcome.
//!
//! Precondition checks run in order (missing source, already WebP), then the
//! conversion proper: read, encode, write, verify, decide the original's
//! fate, and commit the `completed` transition. Any failure along the way is
//! captured into the record as `failed` and re-raised so the worker's
//! substrate accounting decides whether another attempt is scheduled.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use imgpress_core::types::ConversionTransition;
use imgpress_core::{BlobStore, ImageCodec, ImageRecord, ImageStore, ImgpressError, clip_diagnostic};

use crate::policy;

/// Skip reason recorded when the source blob has vanished.
pub const SKIP_REASON_SOURCE_MISSING: &str = "source_file_not_found";

/// Terminal outcome of one job execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The record now points at the WebP file.
    Completed { webp_path: String, new_size: i64 },
    /// Source blob missing; soft-terminal, the sweeper may re-enqueue.
    Skipped,
    /// Source was already WebP; absorbing.
    AlreadyConverted,
}

/// Executes conversion attempts against one image record at a time.
pub struct ConversionJob {
    store: Arc<dyn ImageStore>,
    blobs: Arc<dyn BlobStore>,
    codec: Arc<dyn ImageCodec>,
}

impl ConversionJob {
    pub fn new(
        store: Arc<dyn ImageStore>,
        blobs: Arc<dyn BlobStore>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        Self {
            store,
            blobs,
            codec,
        }
    }

    /// Run one conversion attempt.
    ///
    /// `attempt` is the current attempt number as counted by the queue
    /// substrate (1-based). On failure the record is marked `failed` and the
    /// error is re-raised for the substrate's retry accounting.
    pub async fn run(
        &self,
        image: &ImageRecord,
        attempt: i32,
    ) -> Result<JobOutcome, ImgpressError> {
        let job_id = format!("webp_{}", Uuid::new_v4().simple());
        info!(job_id, image_id = %image.id, attempt, "conversion job started");

        // Captured before any check so every terminal state records it.
        let original_size = image.size;

        if !self.blobs.exists(&image.path).await? {
            warn!(job_id, image_id = %image.id, path = %image.path, "source file not found");
            self.store
                .apply_transition(
                    &image.id,
                    &ConversionTransition::Skipped {
                        reason: SKIP_REASON_SOURCE_MISSING.to_string(),
                        original_size,
                    },
                )
                .await?;
            return Ok(JobOutcome::Skipped);
        }

        if image.mime == "image/webp" {
            info!(job_id, image_id = %image.id, "already in webp format");
            self.store
                .apply_transition(
                    &image.id,
                    &ConversionTransition::AlreadyConverted { original_size },
                )
                .await?;
            return Ok(JobOutcome::AlreadyConverted);
        }

        match self.convert(image, attempt, original_size, &job_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(
                    job_id,
                    image_id = %image.id,
                    attempt,
                    error = %err,
                    "conversion job failed"
                );
                let failed = ConversionTransition::Failed {
                    error: clip_diagnostic(&err.to_string()),
                    attempts: attempt,
                    original_size,
                };
                if let Err(update_err) = self.store.apply_transition(&image.id, &failed).await {
                    error!(
                        job_id,
                        image_id = %image.id,
                        error = %update_err,
                        "could not record conversion failure"
                    );
                }
                Err(err)
            }
        }
    }

    async fn convert(
        &self,
        image: &ImageRecord,
        attempt: i32,
        original_size: i64,
        job_id: &str,
    ) -> Result<JobOutcome, ImgpressError> {
        let webp_path = policy::derive_webp_path(&image.path);
        let quality = policy::select_quality(&image.mime);

        let source = self.blobs.read(&image.path).await?;
        let encoded = self.codec.encode_webp(&source, quality).await?;
        self.blobs.write(&webp_path, &encoded).await?;

        // Codec and write success are not trusted blindly.
        if !self.blobs.exists(&webp_path).await? {
            return Err(ImgpressError::Codec {
                message: "webp file was not created".to_string(),
            });
        }
        let new_size = self.blobs.size(&webp_path).await? as i64;

        if policy::should_delete_original(original_size as u64, new_size as u64) {
            self.blobs.delete(&image.path).await?;
            info!(
                job_id,
                image_id = %image.id,
                saved_bytes = original_size - new_size,
                "original file deleted"
            );
        } else {
            warn!(
                job_id,
                image_id = %image.id,
                original_size,
                webp_size = new_size,
                "webp larger than original, keeping both"
            );
        }

        let ratio = policy::compression_ratio(original_size as u64, new_size as u64);
        self.store
            .apply_transition(
                &image.id,
                &ConversionTransition::Completed {
                    webp_path: webp_path.clone(),
                    new_size,
                    quality: i32::from(quality),
                    original_size,
                    compression_ratio: ratio,
                    attempts: attempt,
                },
            )
            .await?;

        info!(
            job_id,
            image_id = %image.id,
            original_size,
            new_size,
            saved_percent = ratio,
            quality,
            "conversion job completed"
        );

        Ok(JobOutcome::Completed { webp_path, new_size })
    }
}
