// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imgpress serve` command implementation.
//!
//! Wires the full service together: SQLite store, local blob store, the
//! probed image codec, the conversion worker pool, the cron-scheduled retry
//! sweep, and the HTTP gateway. Supports graceful shutdown via Ctrl-C.

use std::str::FromStr;
use std::sync::Arc;

use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use imgpress_blob::LocalBlobStore;
use imgpress_config::ImgpressConfig;
use imgpress_config::model::RetryConfig;
use imgpress_core::types::{RetryCriteria, RetryStatusFilter};
use imgpress_core::{BlobStore, ImageStore, ImgpressError};
use imgpress_gateway::GatewayState;
use imgpress_pipeline::{ImageService, RetrySweeper, WorkerPool};
use imgpress_storage::SqliteStore;

/// Runs the `imgpress serve` command.
pub async fn run_serve(config: ImgpressConfig) -> Result<(), ImgpressError> {
    init_tracing(&config.service.log_level);

    info!("starting imgpress serve");

    // Codec availability is a startup precondition: per-image retries
    // cannot fix a missing codec, so refuse to start without one.
    let codec = imgpress_codec::select_codec(&imgpress_codec::default_candidates())?;

    let store = Arc::new(SqliteStore::new(
        config.storage.clone(),
        config.conversion.max_attempts,
    ));
    store.initialize().await?;
    let store_trait: Arc<dyn ImageStore> = store.clone();

    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.blob.root));

    let service = Arc::new(ImageService::new(
        store_trait.clone(),
        blobs.clone(),
        config.upload.clone(),
    ));

    let shutdown = CancellationToken::new();

    let pool = Arc::new(WorkerPool::new(
        store_trait.clone(),
        blobs,
        codec,
        config.conversion.clone(),
    ));
    let worker_handles = pool.spawn(shutdown.clone());

    let sweep_handle = tokio::spawn(run_scheduled_sweeps(
        RetrySweeper::new(store_trait.clone()),
        config.retry.clone(),
        config.conversion.max_attempts,
        shutdown.clone(),
    ));

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_shutdown.cancel();
        }
    });

    let state = GatewayState {
        service,
        // Headroom above the upload cap so oversized files fail validation
        // with a clean 422 rather than a connection error.
        body_limit: config.upload.max_size_bytes as usize + 1024 * 1024,
    };
    let result = imgpress_gateway::serve(&config.gateway, state, shutdown.clone()).await;

    shutdown.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }
    let _ = sweep_handle.await;
    store.close().await?;
    info!("imgpress serve stopped");

    result
}

/// Run the retry sweep on the configured cron schedule until shutdown.
///
/// Sweeps never overlap themselves: the next occurrence is computed only
/// after the previous sweep finished.
async fn run_scheduled_sweeps(
    sweeper: RetrySweeper,
    retry: RetryConfig,
    max_attempts: i32,
    shutdown: CancellationToken,
) {
    // The expression was validated at config load.
    let cron = match Cron::from_str(&retry.schedule) {
        Ok(cron) => cron,
        Err(err) => {
            error!(schedule = %retry.schedule, error = %err, "invalid sweep schedule");
            return;
        }
    };

    loop {
        let now = chrono::Utc::now();
        let next = match cron.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(err) => {
                error!(error = %err, "cannot compute next sweep occurrence");
                return;
            }
        };
        let delay = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "next scheduled retry sweep");

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let criteria = RetryCriteria {
            hours: retry.hours,
            limit: retry.limit,
            status: RetryStatusFilter::Failed,
            force: false,
            max_attempts,
        };
        match sweeper.sweep(&criteria, false).await {
            Ok(outcome) => {
                info!(
                    selected = outcome.candidates.len(),
                    retried = outcome.retried,
                    "scheduled retry sweep complete"
                );
            }
            Err(err) => {
                error!(error = %err, "scheduled retry sweep failed");
            }
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
