// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request-scoped result types for the strip pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::vision::detection::Detection;
use crate::vision::geometry::BoundingBox;
use crate::vision::ocr::ParsedLine;

/// OCR output for one strip region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionText {
    pub lines: Vec<ParsedLine>,
    /// Non-empty line texts joined with single spaces
    pub aggregated_text: String,
    /// Line tokens concatenated in line order
    pub aggregated_tokens: Vec<String>,
}

impl RegionText {
    pub fn from_lines(lines: Vec<ParsedLine>) -> Self {
        let aggregated_text = lines
            .iter()
            .map(|line| line.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let aggregated_tokens = lines.iter().flat_map(|line| line.tokens.iter().cloned()).collect();

        Self {
            lines,
            aggregated_text,
            aggregated_tokens,
        }
    }
}

/// One detected strip with its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    /// Detector output, coordinates as reported by the detector
    pub detection: Detection,
    pub ocr: RegionText,
    /// The clamped box actually cropped
    pub crop_box: BoundingBox,
    /// `data:image/jpeg;base64,...` when crops were requested
    pub crop_base64: Option<String>,
}

/// Why a region kept its detection but lost its text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionFailure {
    #[error("recognition failed: {0}")]
    Recognition(String),
}

/// Why a region was omitted from the response
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DropReason {
    #[error("box {bbox:?} has no area inside the image")]
    DegenerateBox { bbox: BoundingBox },

    #[error("crop {crop_box:?} could not be cut from the image: {reason}")]
    CropFailed { crop_box: BoundingBox, reason: String },
}

/// Outcome of aggregating one detection
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Extracted(RegionResult),
    /// Recognition failed; the region is kept with no lines
    Degraded {
        result: RegionResult,
        reason: RegionFailure,
    },
    Dropped(DropReason),
}

impl RegionOutcome {
    pub fn into_result(self) -> Option<RegionResult> {
        match self {
            RegionOutcome::Extracted(result) | RegionOutcome::Degraded { result, .. } => Some(result),
            RegionOutcome::Dropped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
}

/// Static model metadata echoed in every response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub detector_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognizer_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognizer_language: Option<String>,
    pub img_size: u32,
}

/// `/detect_full` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub image_meta: ImageMeta,
    pub strips: Vec<RegionResult>,
    pub meta: ModelMeta,
}

/// `/detect` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectOnlyResponse {
    pub detections: Vec<Detection>,
    pub meta: ModelMeta,
}

/// Per-region summary of one pipeline run, indexed by detector order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub detections: usize,
    pub extracted: usize,
    pub degraded: Vec<(usize, RegionFailure)>,
    pub dropped: Vec<(usize, DropReason)>,
}

/// Per-request settings derived from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub detector_model: String,
    pub recognizer_model: String,
    pub recognizer_language: String,
    pub img_size: u32,
    pub max_upload_bytes: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            detector_model: config.detector.model_id.clone(),
            recognizer_model: config.recognizer.model_id.clone(),
            recognizer_language: config.recognizer.language.clone(),
            img_size: config.detector.img_size,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn full_meta(&self) -> ModelMeta {
        ModelMeta {
            detector_model: self.detector_model.clone(),
            recognizer_model: Some(self.recognizer_model.clone()),
            recognizer_language: Some(self.recognizer_language.clone()),
            img_size: self.img_size,
        }
    }

    pub fn detector_meta(&self) -> ModelMeta {
        ModelMeta {
            detector_model: self.detector_model.clone(),
            recognizer_model: None,
            recognizer_language: None,
            img_size: self.img_size,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}
