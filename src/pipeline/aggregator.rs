// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-region OCR aggregation

use image::RgbImage;
use tracing::{debug, warn};

use super::types::{DropReason, RegionFailure, RegionOutcome, RegionResult, RegionText};
use crate::vision::detection::Detection;
use crate::vision::geometry::{clamp_crop, BoundingBox};
use crate::vision::image_utils::{crop_rgb, encode_jpeg_data_uri, CROP_JPEG_QUALITY};
use crate::vision::ocr::{parse_line, TextRecognizer};

/// Clamp, crop, recognize and aggregate one detection
///
/// Never fails: a box with no area inside the image is dropped and a
/// recognizer error degrades the region to zero lines.
pub fn aggregate_region(
    image: &RgbImage,
    detection: &Detection,
    recognizer: &dyn TextRecognizer,
    include_crop: bool,
) -> RegionOutcome {
    let Some(crop_box) = clamp_crop(image.width(), image.height(), detection.bbox) else {
        debug!("Dropping detection with degenerate box {:?}", detection.bbox);
        return RegionOutcome::Dropped(DropReason::DegenerateBox { bbox: detection.bbox });
    };

    let crop = match crop_region(image, crop_box) {
        Ok(crop) => crop,
        Err(reason) => {
            debug!("Dropping detection {:?}: {}", detection.bbox, reason);
            return RegionOutcome::Dropped(reason);
        }
    };

    let (lines, failure) = match recognizer.recognize(&crop) {
        Ok(records) => (records.iter().map(parse_line).collect(), None),
        Err(e) => {
            warn!("Recognition failed for region {:?}: {:#}", crop_box, e);
            (Vec::new(), Some(RegionFailure::Recognition(format!("{:#}", e))))
        }
    };

    let crop_base64 = if include_crop {
        match encode_jpeg_data_uri(&crop, CROP_JPEG_QUALITY) {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!("Failed to encode crop {:?}: {}", crop_box, e);
                None
            }
        }
    } else {
        None
    };

    let result = RegionResult {
        detection: detection.clone(),
        ocr: RegionText::from_lines(lines),
        crop_box,
        crop_base64,
    };

    match failure {
        None => RegionOutcome::Extracted(result),
        Some(reason) => RegionOutcome::Degraded { result, reason },
    }
}

fn crop_region(image: &RgbImage, crop_box: BoundingBox) -> Result<RgbImage, DropReason> {
    crop_rgb(image, crop_box).map_err(|e| DropReason::CropFailed {
        crop_box,
        reason: e.to_string(),
    })
}
