// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete conversion pipeline.
//!
//! Each test builds an isolated harness (temp SQLite + in-memory blobs),
//! drives the upload service and worker pool directly, and asserts on the
//! resulting record states. Tests are independent and order-insensitive.

use std::sync::Arc;

use imgpress_config::model::{ConversionConfig, UploadConfig};
use imgpress_core::types::{RetryCriteria, RetryStatusFilter};
use imgpress_core::{BlobStore, ConversionStatus, ImageCodec, ImageStore};
use imgpress_pipeline::{ImageService, RetrySweeper, UploadRequest, WorkerPool};
use imgpress_test_utils::{StubCodec, TestHarness};

fn conversion_config() -> ConversionConfig {
    ConversionConfig {
        workers: 1,
        max_attempts: 3,
        backoff_secs: vec![0],
        timeout_secs: 30,
        poll_interval_secs: 1,
    }
}

fn service(harness: &TestHarness) -> ImageService {
    ImageService::new(
        harness.store.clone(),
        harness.blobs.clone(),
        UploadConfig::default(),
    )
}

fn pool(harness: &TestHarness, codec: Arc<dyn ImageCodec>) -> WorkerPool {
    WorkerPool::new(
        harness.store.clone(),
        harness.blobs.clone(),
        codec,
        conversion_config(),
    )
}

fn jpeg_upload(bytes: &[u8]) -> UploadRequest {
    UploadRequest {
        bytes: bytes.to_vec(),
        original_name: "photo.jpg".to_string(),
        mime: "image/jpeg".to_string(),
    }
}

async fn drain(pool: &WorkerPool) {
    while pool.process_next().await.unwrap() {}
}

// ---- Upload through conversion ----

#[tokio::test]
async fn upload_converts_to_webp_and_deletes_original() {
    let harness = TestHarness::new().await.unwrap();
    let outcome = service(&harness)
        .upload("owner-1", jpeg_upload(&vec![0u8; 1000]))
        .await
        .unwrap();
    let original_path = outcome.record.path.clone();

    let pool = pool(&harness, Arc::new(StubCodec::returning(vec![1u8; 600])));
    drain(&pool).await;

    let record = harness
        .store
        .get_image(&outcome.record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::Completed);
    assert_eq!(record.mime, "image/webp");
    assert!(record.path.ends_with(".webp"));
    assert_eq!(record.size, 600);
    assert_eq!(record.original_size, Some(1000));
    assert_eq!(record.compression_ratio, Some(40.0));

    assert!(!harness.blobs.exists(&original_path).await.unwrap());
    assert!(harness.blobs.exists(&record.path).await.unwrap());
}

#[tokio::test]
async fn duplicate_upload_converts_once() {
    let harness = TestHarness::new().await.unwrap();
    let service = service(&harness);

    let first = service.upload("owner-1", jpeg_upload(b"bytes")).await.unwrap();
    let second = service.upload("owner-1", jpeg_upload(b"bytes")).await.unwrap();
    assert!(second.deduplicated);
    assert_eq!(first.record.id, second.record.id);

    let codec = Arc::new(StubCodec::returning(vec![1u8; 3]));
    let pool = pool(&harness, codec.clone());
    drain(&pool).await;

    // One upload, one queue entry, one conversion.
    assert_eq!(codec.calls(), 1);
}

// ---- Failure, exhaustion, and rehabilitation ----

#[tokio::test]
async fn failed_conversion_is_rehabilitated_by_the_sweeper() {
    let harness = TestHarness::new().await.unwrap();
    let outcome = service(&harness)
        .upload("owner-1", jpeg_upload(&vec![0u8; 1000]))
        .await
        .unwrap();
    let image_id = outcome.record.id.clone();

    // Exhaust the attempt budget with a codec that never succeeds.
    let broken = pool(&harness, Arc::new(StubCodec::failing()));
    drain(&broken).await;

    let record = harness.store.get_image(&image_id).await.unwrap().unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::PermanentlyFailed);
    assert!(record.conversion_permanently_failed_at.is_some());

    // Sweep the permanently-failed record back onto the queue (force: the
    // attempt budget is spent).
    let sweeper = RetrySweeper::new(harness.store.clone() as Arc<dyn ImageStore>);
    let swept = sweeper
        .sweep(
            &RetryCriteria {
                hours: 24,
                limit: 50,
                status: RetryStatusFilter::PermanentlyFailed,
                force: true,
                max_attempts: 3,
            },
            false,
        )
        .await
        .unwrap();
    assert_eq!(swept.retried, 1);

    let reset = harness.store.get_image(&image_id).await.unwrap().unwrap();
    assert_eq!(reset.conversion_status, ConversionStatus::Pending);
    assert_eq!(reset.conversion_attempts, 0);
    assert!(reset.conversion_permanently_failed_at.is_none());

    // A healthy codec finishes the job on the fresh attempt budget.
    let fixed = pool(&harness, Arc::new(StubCodec::returning(vec![1u8; 500])));
    drain(&fixed).await;

    let record = harness.store.get_image(&image_id).await.unwrap().unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::Completed);
    assert_eq!(record.conversion_attempts, 1);
}

#[tokio::test]
async fn missing_source_is_skipped_and_swept_separately() {
    let harness = TestHarness::new().await.unwrap();
    let outcome = service(&harness)
        .upload("owner-1", jpeg_upload(b"temporarily here"))
        .await
        .unwrap();

    // The blob vanishes before the worker gets to it.
    harness.blobs.delete(&outcome.record.path).await.unwrap();

    let pool = pool(&harness, Arc::new(StubCodec::returning(vec![1u8; 5])));
    drain(&pool).await;

    let record = harness
        .store
        .get_image(&outcome.record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::Skipped);
    assert_eq!(
        record.conversion_skip_reason.as_deref(),
        Some("source_file_not_found")
    );
    // A skip is not a failure: the attempt counter is untouched.
    assert_eq!(record.conversion_attempts, 0);

    // The skipped-status sweep picks it up once the file is back.
    harness
        .blobs
        .write(&record.path, b"temporarily here")
        .await
        .unwrap();
    let sweeper = RetrySweeper::new(harness.store.clone() as Arc<dyn ImageStore>);
    let swept = sweeper
        .sweep(
            &RetryCriteria {
                hours: 24,
                limit: 50,
                status: RetryStatusFilter::Skipped,
                force: false,
                max_attempts: 3,
            },
            false,
        )
        .await
        .unwrap();
    assert_eq!(swept.retried, 1);

    drain(&pool).await;
    let record = harness
        .store
        .get_image(&outcome.record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::Completed);
}

#[tokio::test]
async fn already_webp_upload_is_absorbing() {
    let harness = TestHarness::new().await.unwrap();
    let service = ImageService::new(
        harness.store.clone(),
        harness.blobs.clone(),
        UploadConfig {
            allowed_mime: vec!["image/webp".to_string()],
            ..UploadConfig::default()
        },
    );
    let outcome = service
        .upload(
            "owner-1",
            UploadRequest {
                bytes: b"already webp".to_vec(),
                original_name: "photo.webp".to_string(),
                mime: "image/webp".to_string(),
            },
        )
        .await
        .unwrap();

    let codec = Arc::new(StubCodec::returning(vec![1u8; 5]));
    let pool = pool(&harness, codec.clone());
    drain(&pool).await;

    let record = harness
        .store
        .get_image(&outcome.record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.conversion_status, ConversionStatus::AlreadyConverted);
    assert_eq!(codec.calls(), 0);

    // already_converted is excluded from every sweep filter.
    let sweeper = RetrySweeper::new(harness.store.clone() as Arc<dyn ImageStore>);
    for status in [
        RetryStatusFilter::Failed,
        RetryStatusFilter::Skipped,
        RetryStatusFilter::PermanentlyFailed,
        RetryStatusFilter::All,
    ] {
        let outcome = sweeper
            .sweep(
                &RetryCriteria {
                    hours: 0,
                    limit: 50,
                    status,
                    force: true,
                    max_attempts: 3,
                },
                true,
            )
            .await
            .unwrap();
        assert!(outcome.candidates.is_empty(), "{status:?} must not select");
    }
}
