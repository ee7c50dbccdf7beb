// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/images, GET /v1/images, GET /v1/images/{id},
//! DELETE /v1/images/{id}, GET /v1/health.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use imgpress_core::{ImageRecord, ImgpressError};
use imgpress_pipeline::UploadRequest;

use crate::server::GatewayState;

/// Response body for POST /v1/images.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// The created record, or the pre-existing one on a dedup hit.
    pub image: ImageRecord,
    /// True when the content hash matched an existing record.
    pub deduplicated: bool,
}

/// Query parameters for GET /v1/images.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Response body for GET /v1/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Error wrapper mapping domain errors onto HTTP statuses.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ImgpressError> for ApiError {
    fn from(err: ImgpressError) -> Self {
        match &err {
            ImgpressError::InvalidUpload { message } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message.clone())
            }
            _ => {
                tracing::error!(error = %err, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Extract the explicit owner identity from the `X-Owner-Id` header.
fn owner_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-owner-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "missing X-Owner-Id header"))
}

/// POST /v1/images
///
/// Multipart upload with a single `file` field. Returns 201 with the new
/// record, or 200 with the existing record on a dedup hit. Validation
/// failures (mime, size) map to 422; conversion always happens later, so a
/// success response only means the original is stored and queued.
pub async fn upload_image(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let owner = owner_id(&headers)?;

    let mut upload: Option<UploadRequest> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mime = field.content_type().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
        upload = Some(UploadRequest {
            bytes: bytes.to_vec(),
            original_name,
            mime,
        });
    }

    let Some(upload) = upload else {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "missing `file` field",
        ));
    };

    let outcome = state.service.upload(&owner, upload).await?;
    let status = if outcome.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(UploadResponse {
            image: outcome.record,
            deduplicated: outcome.deduplicated,
        }),
    )
        .into_response())
}

/// GET /v1/images
pub async fn list_images(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let owner = owner_id(&headers)?;
    let page = state
        .service
        .list(&owner, params.page, params.per_page)
        .await?;
    Ok(Json(page).into_response())
}

/// GET /v1/images/{id}
pub async fn show_image(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let owner = owner_id(&headers)?;
    match state.service.get(&owner, &id).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "no such image")),
    }
}

/// DELETE /v1/images/{id}
pub async fn delete_image(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let owner = owner_id(&headers)?;
    if state.service.delete(&owner, &id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::new(StatusCode::NOT_FOUND, "no such image"))
    }
}

/// GET /v1/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
