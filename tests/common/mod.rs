// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared stubs and fixtures for integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use medstrip_ocr::{
    api::AppState,
    pipeline::PipelineSettings,
    vision::{BoundingBox, Detection, ModelRegistry, RawLineRecord, StripDetector, TextRecognizer},
};
use serde_json::Value;

pub const BOUNDARY: &str = "medstrip-test-boundary";

/// Detector returning a fixed list and counting calls
#[derive(Default)]
pub struct StubDetector {
    pub detections: Vec<Detection>,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl StubDetector {
    pub fn with_boxes(boxes: &[[i64; 4]]) -> Self {
        let detections = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| Detection::new(BoundingBox::from(*b), 0.9 - i as f32 * 0.1, 0, "medicine_strip"))
            .collect();
        Self {
            detections,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StripDetector for StubDetector {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.detections.clone())
    }
}

pub struct FailingDetector;

impl StripDetector for FailingDetector {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("detector output had unexpected shape")
    }
}

/// Recognizer replaying JSON line records for every crop
#[derive(Default)]
pub struct StubRecognizer {
    pub lines: Vec<Value>,
    pub calls: AtomicUsize,
    /// 1-based call numbers that fail
    pub fail_on: Vec<usize>,
}

impl StubRecognizer {
    pub fn with_lines(lines: Vec<Value>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for StubRecognizer {
    fn recognize(&self, _image: &RgbImage) -> anyhow::Result<Vec<RawLineRecord>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            anyhow::bail!("recognizer crashed on call {}", call);
        }
        self.lines
            .iter()
            .map(|line| RawLineRecord::from_value(line).map_err(anyhow::Error::from))
            .collect()
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

/// Hand-built multipart/form-data body
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File(name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"strip.png\"\r\nContent-Type: image/png\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value).as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn app_state(
    detector: Option<Arc<dyn StripDetector>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
) -> AppState {
    app_state_with_timeout(detector, recognizer, Duration::from_secs(10))
}

pub fn app_state_with_timeout(
    detector: Option<Arc<dyn StripDetector>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    request_timeout: Duration,
) -> AppState {
    let settings = PipelineSettings::default();
    AppState {
        registry: Arc::new(ModelRegistry::from_parts(detector, recognizer, &settings)),
        settings,
        request_timeout,
    }
}
