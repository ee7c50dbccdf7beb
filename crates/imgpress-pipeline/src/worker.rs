// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool driving the durable conversion queue.
//!
//! The pool is the retry substrate: workers dequeue entries, execute the
//! [`ConversionJob`] under a deadline, and translate outcomes into queue
//! accounting. Attempt budgets and backoff live in the queue; the worker's
//! only record-level responsibility is marking `processing` at dispatch and
//! `permanently_failed` at exhaustion.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use imgpress_config::model::ConversionConfig;
use imgpress_core::types::{ConversionTransition, QueueEntry};
use imgpress_core::{BlobStore, ImageCodec, ImageStore, ImgpressError, clip_diagnostic};

use crate::job::ConversionJob;

/// Pool of conversion workers over the durable queue.
pub struct WorkerPool {
    store: Arc<dyn ImageStore>,
    job: Arc<ConversionJob>,
    config: ConversionConfig,
}

impl WorkerPool {
    pub fn new(
        store: Arc<dyn ImageStore>,
        blobs: Arc<dyn BlobStore>,
        codec: Arc<dyn ImageCodec>,
        config: ConversionConfig,
    ) -> Self {
        let job = Arc::new(ConversionJob::new(store.clone(), blobs, codec));
        Self { store, job, config }
    }

    /// Spawn the configured number of workers. Each runs until `shutdown`
    /// fires, then drains its in-flight entry and stops.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        info!(workers = self.config.workers, "starting conversion workers");
        (0..self.config.workers)
            .map(|worker_id| {
                let pool = Arc::clone(&self);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    pool.run_worker(worker_id, shutdown).await;
                })
            })
            .collect()
    }

    /// Dequeue and process at most one entry. Returns whether an entry ran.
    ///
    /// This is the single step the worker loop repeats; tests and the CLI
    /// can call it directly to drain a queue deterministically.
    pub async fn process_next(&self) -> Result<bool, ImgpressError> {
        match self.store.dequeue_conversion().await? {
            Some(entry) => {
                self.process_entry(entry).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_worker(&self, worker_id: usize, shutdown: CancellationToken) {
        debug!(worker_id, "conversion worker started");
        let idle = Duration::from_secs(self.config.poll_interval_secs.max(1));
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            match self.process_next().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
                Err(err) => {
                    error!(worker_id, error = %err, "queue poll failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(idle) => {}
                    }
                }
            }
        }
        debug!(worker_id, "conversion worker stopped");
    }

    async fn process_entry(&self, entry: QueueEntry) {
        let image = match self.store.get_image(&entry.image_id).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                warn!(
                    entry_id = entry.id,
                    image_id = %entry.image_id,
                    "queue entry references a missing record, dropping"
                );
                if let Err(err) = self.store.ack_conversion(entry.id).await {
                    error!(entry_id = entry.id, error = %err, "could not drop orphaned entry");
                }
                return;
            }
            Err(err) => {
                error!(entry_id = entry.id, error = %err, "could not load record for entry");
                self.record_failed_attempt(entry.id, &entry.image_id).await;
                return;
            }
        };

        // The substrate counts attempts; the job receives the current one.
        let attempt = entry.attempts + 1;

        if let Err(err) = self
            .store
            .apply_transition(&image.id, &ConversionTransition::Processing)
            .await
        {
            warn!(image_id = %image.id, error = %err, "could not mark record processing");
        }

        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.job.run(&image, attempt)).await {
            Ok(Ok(_outcome)) => {
                if let Err(err) = self.store.ack_conversion(entry.id).await {
                    error!(entry_id = entry.id, error = %err, "could not ack completed entry");
                }
            }
            Ok(Err(_err)) => {
                // The job already recorded the failed transition; only the
                // substrate bookkeeping is left.
                self.record_failed_attempt(entry.id, &image.id).await;
            }
            Err(_elapsed) => {
                warn!(
                    image_id = %image.id,
                    timeout_secs = self.config.timeout_secs,
                    "conversion timed out, abandoning execution"
                );
                let failed = ConversionTransition::Failed {
                    error: clip_diagnostic(&format!(
                        "conversion timed out after {}s",
                        self.config.timeout_secs
                    )),
                    attempts: attempt,
                    original_size: image.size,
                };
                if let Err(err) = self.store.apply_transition(&image.id, &failed).await {
                    error!(image_id = %image.id, error = %err, "could not record timeout failure");
                }
                self.record_failed_attempt(entry.id, &image.id).await;
            }
        }
    }

    async fn record_failed_attempt(&self, entry_id: i64, image_id: &str) {
        match self
            .store
            .fail_conversion(entry_id, &self.config.backoff_secs)
            .await
        {
            Ok(outcome) if outcome.exhausted => {
                warn!(
                    image_id,
                    attempts = outcome.attempts,
                    "attempt budget exhausted, marking permanently failed"
                );
                if let Err(err) = self
                    .store
                    .apply_transition(image_id, &ConversionTransition::PermanentlyFailed)
                    .await
                {
                    error!(image_id, error = %err, "could not mark record permanently failed");
                }
            }
            Ok(_) => {}
            Err(err) => {
                error!(entry_id, image_id, error = %err, "could not record failed attempt");
            }
        }
    }
}
