// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decode, detect and aggregate one uploaded image

use std::sync::Arc;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::aggregator::aggregate_region;
use super::types::{
    DetectOnlyResponse, DetectionResponse, ImageMeta, PipelineReport, PipelineSettings, RegionOutcome,
};
use crate::vision::detection::{Detection, StripDetector};
use crate::vision::image_utils::{decode_image_bytes, format_to_extension, ImageError};
use crate::vision::ocr::TextRecognizer;

/// Request-level failures; per-region problems never surface here
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    #[error("Detection failed: {0:#}")]
    DetectionFailed(anyhow::Error),
}

/// Strip detection and OCR over injected model backends
#[derive(Clone)]
pub struct StripPipeline {
    detector: Arc<dyn StripDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for StripPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StripPipeline {
    pub fn new(
        detector: Arc<dyn StripDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            detector,
            recognizer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Full pipeline for `/detect_full`
    pub fn run(&self, upload: &[u8], include_crops: bool) -> Result<DetectionResponse, PipelineError> {
        self.run_with_report(upload, include_crops).map(|(response, _)| response)
    }

    /// Like `run`, also returning what happened to each detection
    pub fn run_with_report(
        &self,
        upload: &[u8],
        include_crops: bool,
    ) -> Result<(DetectionResponse, PipelineReport), PipelineError> {
        let image = decode_upload(upload, self.settings.max_upload_bytes)?;
        let detections = detect_with(self.detector.as_ref(), &image)?;

        let mut report = PipelineReport {
            detections: detections.len(),
            ..PipelineReport::default()
        };
        let mut strips = Vec::with_capacity(detections.len());

        for (index, detection) in detections.iter().enumerate() {
            match aggregate_region(&image, detection, self.recognizer.as_ref(), include_crops) {
                RegionOutcome::Extracted(result) => {
                    report.extracted += 1;
                    strips.push(result);
                }
                RegionOutcome::Degraded { result, reason } => {
                    report.degraded.push((index, reason));
                    strips.push(result);
                }
                RegionOutcome::Dropped(reason) => report.dropped.push((index, reason)),
            }
        }

        info!(
            "Processed {}x{} image: {} detections, {} extracted, {} degraded, {} dropped",
            image.width(),
            image.height(),
            report.detections,
            report.extracted,
            report.degraded.len(),
            report.dropped.len()
        );

        let response = DetectionResponse {
            image_meta: image_meta(&image),
            strips,
            meta: self.settings.full_meta(),
        };
        Ok((response, report))
    }

    /// Detection only, for `/detect`
    pub fn detect(&self, upload: &[u8]) -> Result<DetectOnlyResponse, PipelineError> {
        detect_only(self.detector.as_ref(), upload, &self.settings)
    }
}

/// Decode and detect without a recognizer
pub fn detect_only(
    detector: &dyn StripDetector,
    upload: &[u8],
    settings: &PipelineSettings,
) -> Result<DetectOnlyResponse, PipelineError> {
    let image = decode_upload(upload, settings.max_upload_bytes)?;
    let detections = detect_with(detector, &image)?;
    info!("Detected {} strips in {}x{} image", detections.len(), image.width(), image.height());

    Ok(DetectOnlyResponse {
        detections,
        meta: settings.detector_meta(),
    })
}

fn decode_upload(upload: &[u8], max_bytes: usize) -> Result<RgbImage, PipelineError> {
    let (image, info) = decode_image_bytes(upload, max_bytes)?;
    debug!(
        "Decoded {} upload: {}x{}, {} bytes",
        format_to_extension(info.format),
        info.width,
        info.height,
        info.size_bytes
    );
    Ok(image)
}

fn detect_with(detector: &dyn StripDetector, image: &RgbImage) -> Result<Vec<Detection>, PipelineError> {
    let detections = detector.detect(image).map_err(|e| {
        warn!("Strip detector failed: {:#}", e);
        PipelineError::DetectionFailed(e)
    })?;
    debug!("Detector returned {} boxes", detections.len());
    Ok(detections)
}

fn image_meta(image: &RgbImage) -> ImageMeta {
    ImageMeta {
        width: image.width(),
        height: image.height(),
    }
}
