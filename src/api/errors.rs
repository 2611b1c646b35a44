// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineError;

/// JSON error body: `{"error": ..., "details": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    MissingUpload,
    InvalidImage(String),
    InvalidRequest(String),
    DetectionFailed(String),
    ServiceUnavailable(String),
    InternalError(String),
    Timeout,
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error, details) = match self {
            ApiError::MissingUpload => ("No file provided", None),
            ApiError::InvalidImage(details) => ("Invalid image file", Some(details.clone())),
            ApiError::InvalidRequest(details) => ("Invalid request", Some(details.clone())),
            ApiError::DetectionFailed(details) => ("Detection failed", Some(details.clone())),
            ApiError::ServiceUnavailable(details) => ("Service unavailable", Some(details.clone())),
            ApiError::InternalError(details) => ("Internal error", Some(details.clone())),
            ApiError::Timeout => ("Request timed out", None),
        };

        ErrorResponse {
            error: error.to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUpload | ApiError::InvalidImage(_) | ApiError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::DetectionFailed(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingUpload => write!(f, "No file provided"),
            ApiError::InvalidImage(msg) => write!(f, "Invalid image file: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::DetectionFailed(msg) => write!(f, "Detection failed: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidImage(e) => ApiError::InvalidImage(e.to_string()),
            PipelineError::DetectionFailed(e) => ApiError::DetectionFailed(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
