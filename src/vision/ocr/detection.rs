// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text-line detection
//!
//! The detection model emits a probability map `[1, 1, H, W]` where each pixel
//! is the likelihood of belonging to text. Lines are recovered as 4-connected
//! components above the threshold.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use ort::value::Value;
use tracing::debug;

use crate::vision::geometry::Point;
use crate::vision::onnx::SharedSession;
use crate::vision::preprocessing::preprocess_for_text_detection;

/// Components smaller than this many pixels are treated as noise
pub const MIN_REGION_PIXELS: usize = 10;

/// A detected text line in source image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Corners clockwise from top-left
    pub polygon: [Point; 4],
    /// Mean probability over the component
    pub score: f32,
}

impl TextLine {
    pub fn width(&self) -> f64 {
        self.polygon[1][0] - self.polygon[0][0]
    }

    pub fn height(&self) -> f64 {
        self.polygon[2][1] - self.polygon[1][1]
    }
}

/// Axis-aligned component bounds in probability-map pixels (inclusive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
    pub pixels: usize,
    pub score: f32,
}

/// Text-line detector over the PaddleOCR det model
#[derive(Debug, Clone)]
pub struct TextLineDetector {
    session: SharedSession,
    threshold: f32,
}

impl TextLineDetector {
    pub fn new(model_path: &Path, threshold: f32, intra_threads: usize) -> Result<Self> {
        Ok(Self {
            session: SharedSession::load(model_path, "OCR detection", intra_threads)?,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Find text lines in `image`, ordered top-to-bottom then left-to-right
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<TextLine>> {
        let (tensor, letterbox) = preprocess_for_text_detection(image);
        let input_size = tensor.shape()[2];

        let regions = {
            let mut session = self.session.lock()?;
            let input = Value::from_array(tensor).context("Failed to create input tensor")?;
            let outputs = session
                .run(ort::inputs![self.session.input_name() => input])
                .context("Text detection inference failed")?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract probability map")?;
            debug!("Text detection output shape: {:?}", output.shape());

            let map = probability_map(output.view())?;
            let scale = input_size as f32 / map.ncols().max(1) as f32;
            extract_regions(map, self.threshold)
                .into_iter()
                .map(|r| (r, scale))
                .collect::<Vec<_>>()
        };

        let lines: Vec<TextLine> = regions
            .into_iter()
            .map(|(region, scale)| {
                let (x1, y1) = letterbox.map_clipped(region.min_x as f32 * scale, region.min_y as f32 * scale);
                let (x2, y2) = letterbox.map_clipped(
                    (region.max_x + 1) as f32 * scale,
                    (region.max_y + 1) as f32 * scale,
                );
                let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
                TextLine {
                    polygon: [[x1, y1], [x2, y1], [x2, y2], [x1, y2]],
                    score: region.score,
                }
            })
            .filter(|line| line.width() >= 1.0 && line.height() >= 1.0)
            .collect();

        debug!("Detected {} text lines", lines.len());
        Ok(lines)
    }
}

/// Reduce `[1, 1, H, W]` or `[1, H, W]` to the `H x W` map
pub fn probability_map(output: ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>> {
    let mut view = output;
    while view.ndim() > 2 {
        if view.shape()[0] != 1 {
            anyhow::bail!("Unexpected probability map shape: {:?}", view.shape());
        }
        view = view.index_axis_move(Axis(0), 0);
    }
    view.into_dimensionality::<Ix2>()
        .context("Unexpected probability map rank")
}

/// Connected components of pixels at or above `threshold`
///
/// Regions under `MIN_REGION_PIXELS` are dropped. Output is sorted by top edge,
/// then left edge.
pub fn extract_regions(map: ArrayView2<'_, f32>, threshold: f32) -> Vec<Region> {
    let (height, width) = map.dim();
    let mut visited = vec![false; height * width];
    let mut regions = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || map[[y, x]] < threshold {
                continue;
            }
            let region = flood_fill(&map, &mut visited, x, y, threshold);
            if region.pixels >= MIN_REGION_PIXELS {
                regions.push(region);
            }
        }
    }

    regions.sort_by_key(|r| (r.min_y, r.min_x));
    regions
}

fn flood_fill(
    map: &ArrayView2<'_, f32>,
    visited: &mut [bool],
    start_x: usize,
    start_y: usize,
    threshold: f32,
) -> Region {
    let (height, width) = map.dim();
    let mut stack = vec![(start_x, start_y)];
    let mut region = Region {
        min_x: start_x,
        min_y: start_y,
        max_x: start_x,
        max_y: start_y,
        pixels: 0,
        score: 0.0,
    };
    let mut sum = 0.0f32;

    while let Some((x, y)) = stack.pop() {
        let idx = y * width + x;
        if visited[idx] || map[[y, x]] < threshold {
            continue;
        }
        visited[idx] = true;
        region.pixels += 1;
        sum += map[[y, x]];

        region.min_x = region.min_x.min(x);
        region.max_x = region.max_x.max(x);
        region.min_y = region.min_y.min(y);
        region.max_y = region.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    region.score = if region.pixels > 0 {
        sum / region.pixels as f32
    } else {
        0.0
    };
    region
}
