// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload parsing for the detect endpoints

use axum_extra::extract::Multipart;
use serde::Deserialize;
use tracing::debug;

use crate::api::errors::ApiError;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Multipart/query field toggling base64 crops
pub const RETURN_CROPS_FIELD: &str = "return_crops";

/// Query parameters for `/detect_full`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectFullParams {
    #[serde(default)]
    pub return_crops: Option<String>,
}

/// Fields read from a detect upload
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub return_crops: Option<String>,
}

impl UploadForm {
    /// The uploaded image bytes, or `MissingUpload`
    pub fn take_file(&mut self) -> Result<Vec<u8>, ApiError> {
        self.file.take().ok_or(ApiError::MissingUpload)
    }
}

/// Read the `file` and `return_crops` fields; other fields are ignored
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                debug!("Received upload {:?} ({} bytes)", file_name, data.len());
                form.file = Some(data.to_vec());
            }
            RETURN_CROPS_FIELD => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                form.return_crops = Some(value);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Parse a boolean form/query value
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
/// An empty value is false.
pub fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ApiError::InvalidRequest(format!(
            "{} must be a boolean, got '{}'",
            RETURN_CROPS_FIELD, other
        ))),
    }
}

/// Resolve `return_crops`; the multipart field wins over the query string
pub fn resolve_return_crops(
    params: &DetectFullParams,
    form: &UploadForm,
) -> Result<bool, ApiError> {
    match form.return_crops.as_deref().or(params.return_crops.as_deref()) {
        Some(value) => parse_flag(value),
        None => Ok(false),
    }
}
