// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for medicine-strip images
//!
//! This module provides:
//! - Strip detection via a YOLOv8 ONNX model
//! - OCR (text-line detection and recognition) via PaddleOCR
//! - Image decoding, geometry and tensor preprocessing
//!
//! All inference runs on CPU through ONNX Runtime.

pub mod detection;
pub mod geometry;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod onnx;
pub mod preprocessing;

pub use detection::{Detection, StripDetector, YoloStripDetector};
pub use geometry::{clamp_crop, polygon_bounds, BoundingBox, Point};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use model_manager::{ModelInfo, ModelRegistry};
pub use ocr::{PaddleOcrRecognizer, RawLineRecord, TextRecognizer};
