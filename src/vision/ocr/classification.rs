// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-line direction classification (0° vs 180°)

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayView1, ArrayViewD, Axis, Ix2};
use ort::value::Value;

use crate::vision::onnx::SharedSession;
use crate::vision::preprocessing::preprocess_for_angle_classification;

/// Rotation of each classifier output class, in degrees
pub const ANGLE_CLASSES: [u32; 2] = [0, 180];

/// Predicted orientation of one text line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAngle {
    pub degrees: u32,
    pub score: f32,
}

impl LineAngle {
    /// True when the line reads upside down with enough certainty
    pub fn needs_rotation(&self, threshold: f32) -> bool {
        self.degrees == 180 && self.score > threshold
    }
}

/// PaddleOCR direction classifier (`cls_model.onnx`)
#[derive(Debug, Clone)]
pub struct AngleClassifier {
    session: SharedSession,
    threshold: f32,
}

impl AngleClassifier {
    pub fn new(model_path: &Path, threshold: f32, intra_threads: usize) -> Result<Self> {
        Ok(Self {
            session: SharedSession::load(model_path, "OCR direction", intra_threads)?,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    pub fn classify(&self, line: &RgbImage) -> Result<LineAngle> {
        let tensor = preprocess_for_angle_classification(line);

        let mut session = self.session.lock()?;
        let input = Value::from_array(tensor).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input])
            .context("Direction classification failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract direction output")?;

        angle_from_output(output.view())
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Read the `[1, 2]` classifier output
pub fn angle_from_output(output: ArrayViewD<'_, f32>) -> Result<LineAngle> {
    let output = output
        .into_dimensionality::<Ix2>()
        .context("Unexpected direction output rank")?;
    if output.nrows() == 0 || output.ncols() != ANGLE_CLASSES.len() {
        anyhow::bail!("Unexpected direction output shape: {:?}", output.shape());
    }

    Ok(angle_from_scores(output.index_axis(Axis(0), 0)))
}

/// Pick the most likely orientation
///
/// Exported models end in a softmax; raw logits are normalized first.
pub fn angle_from_scores(scores: ArrayView1<'_, f32>) -> LineAngle {
    let is_distribution = scores.iter().all(|p| (0.0..=1.0).contains(p))
        && (scores.sum() - 1.0).abs() < 1e-3;

    let probabilities: Vec<f32> = if is_distribution {
        scores.to_vec()
    } else {
        let max = scores.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let exp: Vec<f32> = scores.iter().map(|v| (v - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        exp.iter().map(|v| v / total).collect()
    };

    let (class, score) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

    LineAngle {
        degrees: ANGLE_CLASSES.get(class).copied().unwrap_or(0),
        score,
    }
}
