// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Strip detection
//!
//! The detector is a black box behind `StripDetector`; `yolo` provides the
//! ONNX YOLOv8 implementation used in production.

pub mod yolo;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;

pub use yolo::YoloStripDetector;

/// One detected strip region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in image pixels as reported by the detector (may exceed bounds)
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Detection confidence (0.0-1.0)
    pub confidence: f32,
    pub class_id: u32,
    pub class_name: String,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32, class_id: u32, class_name: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            class_name: class_name.into(),
        }
    }
}

/// Object detector locating medicine strips in a full image
///
/// Implementations are constructed once and shared across requests, so they
/// must be safe to call concurrently (or serialize internally).
#[cfg_attr(test, mockall::automock)]
pub trait StripDetector: Send + Sync {
    /// Detect strips, in the detector's own output order
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}
