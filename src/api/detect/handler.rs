// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect endpoint handlers

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::request::{read_upload, resolve_return_crops, DetectFullParams};
use crate::api::errors::ApiError;
use crate::api::http_server::{run_blocking, AppState};
use crate::pipeline::{detect_only, DetectOnlyResponse, DetectionResponse};

/// POST /detect - Locate medicine strips in an uploaded image
///
/// # Request
/// - multipart field `file`: the image (PNG, JPEG, WebP, GIF, BMP, TIFF)
///
/// # Response
/// - `detections`: boxes with confidence and class, highest confidence first
/// - `meta`: detector model id and input size
///
/// # Errors
/// - 400 Bad Request: no file, or the file is not a decodable image
/// - 503 Service Unavailable: detector not loaded
/// - 500 Internal Server Error: detector failed
/// - 504 Gateway Timeout: request exceeded the configured timeout
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectOnlyResponse>, ApiError> {
    let span = info_span!("detect", request_id = %Uuid::new_v4());

    async move {
        let mut form = read_upload(multipart.map_err(|_| ApiError::MissingUpload)?).await?;
        let upload = form.take_file()?;

        let detector = state.registry.detector().ok_or_else(|| {
            warn!("Strip detector not loaded");
            ApiError::ServiceUnavailable("Strip detector not loaded".to_string())
        })?;
        let settings = state.settings.clone();

        let response = run_blocking(state.request_timeout, move || {
            detect_only(detector.as_ref(), &upload, &settings).map_err(ApiError::from)
        })
        .await
        .inspect_err(|e| warn!("Detect request failed: {}", e))?;

        info!("Detect complete: {} strips", response.detections.len());
        Ok(Json(response))
    }
    .instrument(span)
    .await
}

/// POST /detect_full - Detect strips and read the text on each
///
/// # Request
/// - multipart field `file`: the image
/// - `return_crops` (query or multipart field): include base64 JPEG crops
///
/// # Response
/// - `image_meta`: decoded width and height
/// - `strips`: per-region detection, OCR lines, aggregates and crop box
/// - `meta`: detector and recognizer model ids, recognizer language
///
/// # Errors
/// Same as `/detect`; per-region OCR failures never fail the request.
pub async fn detect_full_handler(
    State(state): State<AppState>,
    Query(params): Query<DetectFullParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResponse>, ApiError> {
    let span = info_span!("detect_full", request_id = %Uuid::new_v4());

    async move {
        let mut form = read_upload(multipart.map_err(|_| ApiError::MissingUpload)?).await?;
        let include_crops = resolve_return_crops(&params, &form)?;
        let upload = form.take_file()?;

        let pipeline = state
            .registry
            .strip_pipeline(state.settings.clone())
            .ok_or_else(|| {
                warn!("Detection or OCR models not loaded");
                ApiError::ServiceUnavailable("Detection or OCR models not loaded".to_string())
            })?;

        let response = run_blocking(state.request_timeout, move || {
            pipeline.run(&upload, include_crops).map_err(ApiError::from)
        })
        .await
        .inspect_err(|e| warn!("Detect full request failed: {}", e))?;

        info!(
            "Detect full complete: {} strips from {}x{} image",
            response.strips.len(),
            response.image_meta.width,
            response.image_meta.height
        );
        Ok(Json(response))
    }
    .instrument(span)
    .await
}
