// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Box geometry: clamping detections to the image and polygon bounds

use serde::{Deserialize, Serialize};

/// A point in pixel space as emitted by recognizers (`[x, y]`)
pub type Point = [f64; 2];

/// Axis-aligned integer box `[x1, y1, x2, y2]`
///
/// Serialized as a four-element JSON array. Coordinates are signed because
/// detector output may lie outside the image before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct BoundingBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl BoundingBox {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from float corners, truncating toward zero
    pub fn from_f32_truncated(corners: [f32; 4]) -> Self {
        Self {
            x1: corners[0].trunc() as i64,
            y1: corners[1].trunc() as i64,
            x2: corners[2].trunc() as i64,
            y2: corners[3].trunc() as i64,
        }
    }

    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    /// True when the box has zero or negative area
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// True when the box lies within `[0, width] x [0, height]`
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (i64::from(width), i64::from(height));
        (0..=w).contains(&self.x1)
            && (0..=w).contains(&self.x2)
            && (0..=h).contains(&self.y1)
            && (0..=h).contains(&self.y2)
    }
}

impl From<[i64; 4]> for BoundingBox {
    fn from(c: [i64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [i64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Clip a box to an image of `width` x `height`
///
/// `x1` is clamped to `[0, w-1]`, `x2` to `[0, w]` (same for y). Coordinates are
/// not reordered: a swapped or fully outside box clamps to zero area and
/// `None` is returned so the caller can skip the detection.
pub fn clamp_crop(width: u32, height: u32, bbox: BoundingBox) -> Option<BoundingBox> {
    let (w, h) = (i64::from(width), i64::from(height));

    let clamped = BoundingBox {
        x1: bbox.x1.clamp(0, (w - 1).max(0)),
        y1: bbox.y1.clamp(0, (h - 1).max(0)),
        x2: bbox.x2.clamp(0, w),
        y2: bbox.y2.clamp(0, h),
    };

    if clamped.is_degenerate() {
        None
    } else {
        Some(clamped)
    }
}

/// Integer bounding box of a polygon
///
/// Each coordinate is truncated toward zero before taking min/max. An empty
/// polygon yields `[0, 0, 0, 0]`.
pub fn polygon_bounds(points: &[Point]) -> BoundingBox {
    let mut iter = points.iter().map(|p| (p[0].trunc() as i64, p[1].trunc() as i64));

    let Some((x, y)) = iter.next() else {
        return BoundingBox::default();
    };

    iter.fold(BoundingBox::new(x, y, x, y), |acc, (x, y)| BoundingBox {
        x1: acc.x1.min(x),
        y1: acc.y1.min(y),
        x2: acc.x2.max(x),
        y2: acc.y2.max(y),
    })
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}
