// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway router construction and server lifecycle.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use imgpress_config::model::GatewayConfig;
use imgpress_core::ImgpressError;
use imgpress_pipeline::ImageService;

use crate::handlers;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<ImageService>,
    /// Request body cap for uploads, in bytes.
    pub body_limit: usize,
}

/// Build the REST router.
///
/// The body limit leaves headroom above the upload cap so that an oversized
/// file reaches the service layer and fails validation with a clean 422
/// instead of an opaque connection error.
pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/v1/images", post(handlers::upload_image).get(handlers::list_images))
        .route(
            "/v1/images/{id}",
            get(handlers::show_image).delete(handlers::delete_image),
        )
        .route("/v1/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the gateway until `shutdown` fires.
pub async fn serve(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ImgpressError> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ImgpressError::Internal(format!("cannot bind gateway to {addr}: {e}")))?;
    info!(addr, "gateway listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ImgpressError::Internal(format!("gateway server error: {e}")))
}
