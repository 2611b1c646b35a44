// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition for detected strip regions
//!
//! Components:
//! - `record` - Raw recognizer line layouts and their canonical parse
//! - `detection` - Text-line detection (PaddleOCR det model)
//! - `classification` - Upside-down line detection (PaddleOCR cls model)
//! - `recognition` - CTC text recognition (PaddleOCR rec model)
//! - `model` - Combined PaddleOCR backend

pub mod classification;
pub mod detection;
pub mod model;
pub mod recognition;
pub mod record;

use image::RgbImage;

pub use classification::{AngleClassifier, LineAngle};
pub use detection::{TextLine, TextLineDetector};
pub use model::PaddleOcrRecognizer;
pub use recognition::{CtcRecognizer, RecognizedText};
pub use record::{parse_line, Candidate, ParsedLine, RawLineRecord, RecordError};

/// Recognizes text lines in an image crop
///
/// Implementations return line records in crop-relative coordinates, in
/// reading order. An empty list means no text was found.
#[cfg_attr(test, mockall::automock)]
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> anyhow::Result<Vec<RawLineRecord>>;
}
