// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR recognizer combining text-line detection and recognition

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use tracing::{debug, warn};

use super::classification::AngleClassifier;
use super::detection::TextLineDetector;
use super::record::RawLineRecord;
use super::recognition::CtcRecognizer;
use super::TextRecognizer;
use crate::config::RecognizerConfig;
use crate::vision::geometry::{clamp_crop, polygon_bounds, Point};
use crate::vision::image_utils::crop_rgb;

pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
pub const CLASSIFIER_MODEL_FILE: &str = "cls_model.onnx";
pub const FALLBACK_DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// Resolve the character dictionary for `language`
///
/// Prefers `<language>_dict.txt` and falls back to the multilingual
/// `ppocr_keys_v1.txt`.
pub fn dictionary_path(model_dir: &Path, language: &str) -> PathBuf {
    let specific = model_dir.join(format!("{}_dict.txt", language));
    if specific.exists() {
        specific
    } else {
        model_dir.join(FALLBACK_DICTIONARY_FILE)
    }
}

/// PaddleOCR backend
///
/// Expected files under `model_dir`:
/// - det_model.onnx (text-line detection)
/// - rec_model.onnx (recognition)
/// - cls_model.onnx (optional, direction classification)
/// - `<language>_dict.txt` or ppocr_keys_v1.txt (character dictionary)
#[derive(Debug, Clone)]
pub struct PaddleOcrRecognizer {
    detection: TextLineDetector,
    recognition: CtcRecognizer,
    classifier: Option<AngleClassifier>,
    language: String,
}

impl PaddleOcrRecognizer {
    pub fn new(config: &RecognizerConfig) -> Result<Self> {
        let dir = &config.model_dir;
        debug!("Loading PaddleOCR models from {}", dir.display());

        let detection = TextLineDetector::new(
            &dir.join(DETECTION_MODEL_FILE),
            config.det_threshold,
            config.intra_threads,
        )?;
        let recognition = CtcRecognizer::new(
            &dir.join(RECOGNITION_MODEL_FILE),
            &dictionary_path(dir, &config.language),
            config.intra_threads,
        )?;
        let classifier = load_classifier(config)?;

        Ok(Self {
            detection,
            recognition,
            classifier,
            language: config.language.clone(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn upright(&self, line: RgbImage) -> RgbImage {
        let Some(classifier) = &self.classifier else {
            return line;
        };
        match classifier.classify(&line) {
            Ok(angle) if angle.needs_rotation(classifier.threshold()) => {
                debug!("Rotating text line 180° (score {:.3})", angle.score);
                image::imageops::rotate180(&line)
            }
            Ok(_) => line,
            Err(e) => {
                warn!("Direction classification failed, keeping line as is: {:#}", e);
                line
            }
        }
    }

    fn recognize_polygon(&self, image: &RgbImage, polygon: [Point; 4]) -> Result<Option<RawLineRecord>> {
        let Some(bbox) = clamp_crop(image.width(), image.height(), polygon_bounds(&polygon)) else {
            return Ok(None);
        };
        let line = crop_rgb(image, bbox).context("Failed to crop text line")?;
        let line = self.upright(line);
        let recognized = self.recognition.recognize(&line)?;

        if recognized.text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(RawLineRecord::Scored {
            polygon: polygon.to_vec(),
            text: recognized.text,
            confidence: Some(recognized.confidence),
        }))
    }
}

/// Load cls_model.onnx when enabled; a missing file disables the step
fn load_classifier(config: &RecognizerConfig) -> Result<Option<AngleClassifier>> {
    if !config.use_angle_cls {
        return Ok(None);
    }

    let path = config.model_dir.join(CLASSIFIER_MODEL_FILE);
    if !path.exists() {
        warn!(
            "⚠️ Direction classifier not found at {}; upside-down lines will not be corrected",
            path.display()
        );
        return Ok(None);
    }

    AngleClassifier::new(&path, config.cls_threshold, config.intra_threads).map(Some)
}

impl TextRecognizer for PaddleOcrRecognizer {
    fn recognize(&self, image: &RgbImage) -> Result<Vec<RawLineRecord>> {
        let lines = self.detection.detect(image)?;

        if lines.is_empty() {
            // No line structure found; treat the whole crop as one line
            let (w, h) = (image.width() as f64, image.height() as f64);
            let whole = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
            return Ok(self.recognize_polygon(image, whole)?.into_iter().collect());
        }

        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match self.recognize_polygon(image, line.polygon) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping text line {:?}: {:#}", line.polygon, e),
            }
        }

        Ok(records)
    }
}
