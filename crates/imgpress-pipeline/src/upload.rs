// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload service: validation, content-hash dedup, blob write, record
//! creation, and conversion dispatch.
//!
//! Dedup runs before any storage side effect: a byte-identical re-upload
//! from the same owner returns the existing record and writes nothing.
//! Conversion is always deferred to the queue; uploads never block on it.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use imgpress_config::model::UploadConfig;
use imgpress_core::types::NewImage;
use imgpress_core::{BlobStore, ImageRecord, ImageStore, ImgpressError, Page};

/// An upload accepted from the HTTP boundary.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub mime: String,
}

/// Result of an upload: the stored (or pre-existing) record.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record: ImageRecord,
    /// True when the content hash matched an existing record and nothing
    /// was written.
    pub deduplicated: bool,
}

/// Front door for image uploads and owner-scoped record access.
pub struct ImageService {
    store: Arc<dyn ImageStore>,
    blobs: Arc<dyn BlobStore>,
    config: UploadConfig,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ImageStore>,
        blobs: Arc<dyn BlobStore>,
        config: UploadConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Accept an upload for `owner_id`.
    ///
    /// Validates mime and size, dedups by SHA-256 content hash, writes the
    /// blob, creates the record, and enqueues the conversion task.
    pub async fn upload(
        &self,
        owner_id: &str,
        request: UploadRequest,
    ) -> Result<UploadOutcome, ImgpressError> {
        validate_owner_id(owner_id)?;
        let size = request.bytes.len() as u64;
        info!(
            owner_id,
            original_name = %request.original_name,
            size,
            "image upload started"
        );

        if !self.config.allowed_mime.iter().any(|m| m == &request.mime) {
            return Err(ImgpressError::InvalidUpload {
                message: format!("unsupported mime type `{}`", request.mime),
            });
        }
        if size > self.config.max_size_bytes {
            return Err(ImgpressError::InvalidUpload {
                message: format!(
                    "upload of {size} bytes exceeds the {} byte limit",
                    self.config.max_size_bytes
                ),
            });
        }

        let hash = hex::encode(Sha256::digest(&request.bytes));

        // Dedup check must precede any storage side effect.
        if let Some(existing) = self.store.find_by_hash(owner_id, &hash).await? {
            info!(
                owner_id,
                existing_image_id = %existing.id,
                hash,
                "duplicate image prevented"
            );
            return Ok(UploadOutcome {
                record: existing,
                deduplicated: true,
            });
        }

        let path = derive_blob_key(owner_id, &request.original_name, &request.mime);
        self.blobs.write(&path, &request.bytes).await?;

        let record = self
            .store
            .create_image(&NewImage {
                owner_id: owner_id.to_string(),
                path: path.clone(),
                original_name: request.original_name.clone(),
                mime: request.mime.clone(),
                size: size as i64,
                content_hash: hash,
            })
            .await?;

        self.store.enqueue_conversion(&record.id).await?;

        info!(
            owner_id,
            image_id = %record.id,
            path = %path,
            size,
            "image uploaded"
        );

        Ok(UploadOutcome {
            record,
            deduplicated: false,
        })
    }

    /// List an owner's images, newest first.
    pub async fn list(
        &self,
        owner_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<ImageRecord>, ImgpressError> {
        self.store
            .list_images(owner_id, page, per_page.clamp(1, 100))
            .await
    }

    /// Fetch one of the owner's images.
    pub async fn get(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<ImageRecord>, ImgpressError> {
        self.store.get_image_for_owner(id, owner_id).await
    }

    /// Delete one of the owner's images: blob first, then record.
    /// Returns false when the owner has no such image.
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<bool, ImgpressError> {
        let Some(image) = self.store.get_image_for_owner(id, owner_id).await? else {
            return Ok(false);
        };
        if let Err(err) = self.blobs.delete(&image.path).await {
            warn!(image_id = %image.id, error = %err, "could not delete blob, removing record anyway");
        }
        self.store.delete_image(&image.id).await
    }
}

fn validate_owner_id(owner_id: &str) -> Result<(), ImgpressError> {
    let valid = !owner_id.is_empty()
        && owner_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ImgpressError::InvalidUpload {
            message: format!("invalid owner id `{owner_id}`"),
        })
    }
}

/// Blob key for a fresh upload: `images/{owner}/image_{epoch}_{rand8}.{ext}`.
fn derive_blob_key(owner_id: &str, original_name: &str, mime: &str) -> String {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| default_extension(mime).to_string());
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "images/{owner_id}/image_{}_{suffix}.{ext}",
        Utc::now().timestamp()
    )
}

fn default_extension(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgpress_config::model::UploadConfig;
    use imgpress_core::ConversionStatus;
    use imgpress_test_utils::TestHarness;

    fn service(harness: &TestHarness) -> ImageService {
        ImageService::new(
            harness.store.clone(),
            harness.blobs.clone(),
            UploadConfig::default(),
        )
    }

    fn jpeg_upload(bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            bytes: bytes.to_vec(),
            original_name: "holiday.JPG".to_string(),
            mime: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn upload_writes_blob_creates_record_and_enqueues() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let outcome = service.upload("owner-1", jpeg_upload(b"jpeg bytes")).await.unwrap();
        assert!(!outcome.deduplicated);
        let record = outcome.record;
        assert_eq!(record.owner_id, "owner-1");
        assert_eq!(record.conversion_status, ConversionStatus::Pending);
        assert_eq!(record.size, 10);
        assert!(record.path.starts_with("images/owner-1/image_"));
        assert!(record.path.ends_with(".jpg"));

        assert!(harness.blobs.exists(&record.path).await.unwrap());
        let entry = harness.store.dequeue_conversion().await.unwrap().unwrap();
        assert_eq!(entry.image_id, record.id);
    }

    #[tokio::test]
    async fn duplicate_upload_returns_existing_record_without_second_write() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let first = service.upload("owner-1", jpeg_upload(b"same bytes")).await.unwrap();
        assert_eq!(harness.blobs.write_count(), 1);

        let second = service.upload("owner-1", jpeg_upload(b"same bytes")).await.unwrap();
        assert!(second.deduplicated);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(harness.blobs.write_count(), 1, "no second blob write");

        // And a third time, still the same record.
        let third = service.upload("owner-1", jpeg_upload(b"same bytes")).await.unwrap();
        assert_eq!(third.record.id, first.record.id);
    }

    #[tokio::test]
    async fn same_bytes_from_another_owner_are_stored_separately() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let a = service.upload("owner-1", jpeg_upload(b"shared")).await.unwrap();
        let b = service.upload("owner-2", jpeg_upload(b"shared")).await.unwrap();
        assert!(!b.deduplicated);
        assert_ne!(a.record.id, b.record.id);
        assert_eq!(harness.blobs.write_count(), 2);
    }

    #[tokio::test]
    async fn rejects_unsupported_mime_before_any_write() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let err = service
            .upload(
                "owner-1",
                UploadRequest {
                    bytes: b"gif bytes".to_vec(),
                    original_name: "anim.gif".to_string(),
                    mime: "image/gif".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ImgpressError::InvalidUpload { .. }));
        assert_eq!(harness.blobs.write_count(), 0);
    }

    #[tokio::test]
    async fn rejects_oversized_uploads_before_any_write() {
        let harness = TestHarness::new().await.unwrap();
        let service = ImageService::new(
            harness.store.clone(),
            harness.blobs.clone(),
            UploadConfig {
                max_size_bytes: 16,
                ..UploadConfig::default()
            },
        );

        let err = service
            .upload("owner-1", jpeg_upload(&vec![0u8; 17]))
            .await
            .unwrap_err();
        assert!(matches!(err, ImgpressError::InvalidUpload { .. }));
        assert_eq!(harness.blobs.write_count(), 0);
    }

    #[tokio::test]
    async fn rejects_path_hostile_owner_ids() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        for owner in ["", "a/b", "../up", "owner id"] {
            let err = service.upload(owner, jpeg_upload(b"x")).await.unwrap_err();
            assert!(matches!(err, ImgpressError::InvalidUpload { .. }), "{owner}");
        }
    }

    #[tokio::test]
    async fn get_and_list_are_owner_scoped() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let mine = service.upload("owner-1", jpeg_upload(b"mine")).await.unwrap();
        service.upload("owner-2", jpeg_upload(b"theirs")).await.unwrap();

        assert!(service.get("owner-1", &mine.record.id).await.unwrap().is_some());
        assert!(service.get("owner-2", &mine.record.id).await.unwrap().is_none());

        let page = service.list("owner-1", 1, 20).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn delete_removes_blob_and_record() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let outcome = service.upload("owner-1", jpeg_upload(b"bytes")).await.unwrap();
        let path = outcome.record.path.clone();

        assert!(service.delete("owner-1", &outcome.record.id).await.unwrap());
        assert!(!harness.blobs.exists(&path).await.unwrap());
        assert!(service.get("owner-1", &outcome.record.id).await.unwrap().is_none());

        // Second delete is a no-op.
        assert!(!service.delete("owner-1", &outcome.record.id).await.unwrap());
    }

    #[tokio::test]
    async fn extension_falls_back_to_mime_when_name_has_none() {
        let harness = TestHarness::new().await.unwrap();
        let service = service(&harness);

        let outcome = service
            .upload(
                "owner-1",
                UploadRequest {
                    bytes: b"png bytes".to_vec(),
                    original_name: "pasted-image".to_string(),
                    mime: "image/png".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(outcome.record.path.ends_with(".png"));
    }
}
