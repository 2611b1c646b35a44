// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 strip detector on ONNX Runtime

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, Ix3};
use ort::value::Value;
use tracing::debug;

use super::{Detection, StripDetector};
use crate::config::DetectorConfig;
use crate::vision::geometry::BoundingBox;
use crate::vision::onnx::SharedSession;
use crate::vision::preprocessing::{preprocess_for_strip_detection, LetterboxInfo};

/// Upper bound on boxes kept after NMS
pub const MAX_DETECTIONS: usize = 300;

/// A raw prediction in model input space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// `[x1, y1, x2, y2]` in letterboxed model coordinates
    pub corners: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.corners[2] - self.corners[0]).max(0.0) * (self.corners[3] - self.corners[1]).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let x1 = self.corners[0].max(other.corners[0]);
        let y1 = self.corners[1].max(other.corners[1]);
        let x2 = self.corners[2].min(other.corners[2]);
        let y2 = self.corners[3].min(other.corners[3]);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// YOLOv8 strip detector
///
/// Runs on CPU; the session is shared and serialized across requests.
#[derive(Debug, Clone)]
pub struct YoloStripDetector {
    session: SharedSession,
    labels: Vec<String>,
    img_size: u32,
    conf_threshold: f32,
    iou_threshold: f32,
}

impl YoloStripDetector {
    /// Load the detector described by `config`
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let session = SharedSession::load(&config.model_path, "Strip detection", config.intra_threads)?;

        Ok(Self {
            session,
            labels: config.labels.clone(),
            img_size: config.img_size,
            conf_threshold: config.conf_threshold.clamp(0.0, 1.0),
            iou_threshold: config.iou_threshold.clamp(0.0, 1.0),
        })
    }

    fn to_detection(&self, candidate: &Candidate, letterbox: &LetterboxInfo) -> Detection {
        let (x1, y1) = letterbox.map_clipped(candidate.corners[0], candidate.corners[1]);
        let (x2, y2) = letterbox.map_clipped(candidate.corners[2], candidate.corners[3]);

        Detection {
            bbox: BoundingBox::from_f32_truncated([x1, y1, x2, y2]),
            confidence: candidate.confidence,
            class_id: candidate.class_id as u32,
            class_name: class_label(&self.labels, candidate.class_id),
        }
    }
}

impl StripDetector for YoloStripDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (tensor, letterbox) = preprocess_for_strip_detection(image, self.img_size);

        let candidates = {
            let mut session = self.session.lock()?;
            let input = Value::from_array(tensor).context("Failed to create input tensor")?;
            let outputs = session
                .run(ort::inputs![self.session.input_name() => input])
                .context("Strip detection inference failed")?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract detection output")?;
            debug!("Strip detection output shape: {:?}", output.shape());

            decode_predictions(output.view(), self.conf_threshold)?
        };

        let kept = non_max_suppression(candidates, self.iou_threshold, MAX_DETECTIONS);
        debug!("Detected {} strip candidates after NMS", kept.len());

        Ok(kept.iter().map(|c| self.to_detection(c, &letterbox)).collect())
    }
}

/// Label for a class index, falling back to `class_<id>`
pub fn class_label(labels: &[String], class_id: usize) -> String {
    labels
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", class_id))
}

/// Decode a YOLOv8 output tensor into thresholded candidates
///
/// Accepts `[1, 4+nc, N]` (the exported default) or the transposed
/// `[1, N, 4+nc]`. Box rows are `cx, cy, w, h` followed by class scores.
pub fn decode_predictions(output: ArrayViewD<f32>, conf_threshold: f32) -> Result<Vec<Candidate>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .context("Unexpected detection output rank")?;
    let (_, a, b) = output.dim();

    // Fewer attribute rows than anchors means channel-major layout
    let channel_major = a < b;
    let (attributes, anchors) = if channel_major { (a, b) } else { (b, a) };
    if attributes < 5 {
        anyhow::bail!("Unexpected detection output shape: {:?}", output.shape());
    }

    let value = |attr: usize, anchor: usize| -> f32 {
        if channel_major {
            output[[0, attr, anchor]]
        } else {
            output[[0, anchor, attr]]
        }
    };

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let (class_id, confidence) = (4..attributes)
            .map(|attr| (attr - 4, value(attr, i)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if confidence < conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (value(0, i), value(1, i), value(2, i), value(3, i));
        candidates.push(Candidate {
            corners: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence,
            class_id,
        });
    }

    Ok(candidates)
}

/// Class-aware non-maximum suppression
///
/// Returns survivors sorted by confidence, highest first.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32, max_detections: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if keep.len() >= max_detections {
            break;
        }
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            keep.push(candidate);
        }
    }

    keep
}
