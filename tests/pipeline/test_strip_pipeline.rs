// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end pipeline tests with stub detector and recognizer

use std::sync::Arc;

use medstrip_ocr::{
    pipeline::{DropReason, PipelineError, PipelineSettings, RegionFailure, StripPipeline},
    vision::BoundingBox,
};
use serde_json::json;

use crate::common::{png_bytes, StubDetector, StubRecognizer};

fn panadol_record() -> serde_json::Value {
    json!([[[0, 0], [5, 0], [5, 5], [0, 5]], ["Panadol  500mg", 0.97]])
}

fn pipeline(detector: Arc<StubDetector>, recognizer: Arc<StubRecognizer>) -> StripPipeline {
    StripPipeline::new(detector, recognizer, PipelineSettings::default())
}

#[test]
fn test_box_overflowing_image_is_clamped() {
    let detector = Arc::new(StubDetector::with_boxes(&[[10, 10, 200, 200]]));
    let recognizer = Arc::new(StubRecognizer::with_lines(vec![panadol_record()]));

    let response = pipeline(detector, recognizer.clone())
        .run(&png_bytes(100, 100), false)
        .unwrap();

    assert_eq!(response.image_meta.width, 100);
    assert_eq!(response.strips.len(), 1);
    assert_eq!(response.strips[0].crop_box, BoundingBox::new(10, 10, 100, 100));
    assert_eq!(recognizer.calls(), 1);
}

#[test]
fn test_box_outside_image_is_dropped() {
    let detector = Arc::new(StubDetector::with_boxes(&[[150, 150, 200, 200]]));
    let recognizer = Arc::new(StubRecognizer::default());

    let (response, report) = pipeline(detector, recognizer.clone())
        .run_with_report(&png_bytes(100, 100), false)
        .unwrap();

    assert!(response.strips.is_empty());
    assert_eq!(recognizer.calls(), 0);
    assert!(matches!(report.dropped[0], (0, DropReason::DegenerateBox { .. })));
}

#[test]
fn test_panadol_line_normalized_and_tokenized() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 40, 40]]));
    let recognizer = Arc::new(StubRecognizer::with_lines(vec![panadol_record()]));

    let response = pipeline(detector, recognizer).run(&png_bytes(40, 40), false).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    let line = &json["strips"][0]["ocr"]["lines"][0];

    assert_eq!(line["text"], "Panadol 500mg");
    assert_eq!(line["tokens"], json!(["panadol", "500mg"]));
    assert_eq!(line["box"], json!([0, 0, 5, 5]));
    assert_eq!(json["strips"][0]["ocr"]["aggregated_text"], "Panadol 500mg");
    assert_eq!(json["meta"]["detector_model"], "medstrip_yolo_v1");
    assert_eq!(json["meta"]["recognizer_language"], "en");
}

#[test]
fn test_invalid_upload_skips_models() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 10, 10]]));
    let recognizer = Arc::new(StubRecognizer::default());
    let pipeline = pipeline(detector.clone(), recognizer.clone());

    let err = pipeline.run(b"GIF89a-truncated", false).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidImage(_)));
    assert_eq!(detector.calls(), 0);
    assert_eq!(recognizer.calls(), 0);
}

#[test]
fn test_mixed_line_shapes_in_one_region() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 60, 60]]));
    let recognizer = Arc::new(StubRecognizer::with_lines(vec![
        json!([[[0, 0], [30, 0], [30, 10], [0, 10]], ["Augmentin", "0.91"]]),
        json!([[[0, 12], [30, 12], [30, 22], [0, 22]], [["625 mg", 0.8], ["625 rng", 0.2]]]),
        json!([[[0, 24], [30, 24], [30, 34], [0, 34]], "اموكسيسيلين"]),
        json!([[[0, 36], [30, 36], [30, 46], [0, 46]], 7]),
    ]));

    let response = pipeline(detector, recognizer).run(&png_bytes(60, 60), false).unwrap();
    let ocr = &response.strips[0].ocr;

    assert_eq!(ocr.lines.len(), 4);
    assert_eq!(ocr.lines[0].confidence, Some(0.91));
    assert_eq!(ocr.lines[1].text, "625 mg");
    assert_eq!(ocr.lines[2].confidence, None);
    assert_eq!(ocr.lines[3].text, "");
    assert_eq!(ocr.aggregated_text, "Augmentin 625 mg اموكسيسيلين");
    assert_eq!(
        ocr.aggregated_tokens,
        vec!["augmentin", "625", "mg", "اموكسيسيلين"]
    );
}

#[test]
fn test_recognizer_failure_is_isolated() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 20, 20], [20, 0, 40, 20]]));
    let recognizer = Arc::new(StubRecognizer {
        lines: vec![panadol_record()],
        fail_on: vec![1],
        ..StubRecognizer::default()
    });

    let (response, report) = pipeline(detector, recognizer)
        .run_with_report(&png_bytes(40, 20), false)
        .unwrap();

    assert_eq!(response.strips.len(), 2);
    assert!(response.strips[0].ocr.lines.is_empty());
    assert_eq!(response.strips[1].ocr.aggregated_tokens, vec!["panadol", "500mg"]);
    assert!(matches!(&report.degraded[0], (0, RegionFailure::Recognition(msg)) if msg.contains("call 1")));
}

#[test]
fn test_crops_returned_on_request() {
    let detector = Arc::new(StubDetector::with_boxes(&[[5, 5, 25, 25]]));
    let recognizer = Arc::new(StubRecognizer::default());
    let pipeline = pipeline(detector, recognizer);

    let without = pipeline.run(&png_bytes(30, 30), false).unwrap();
    assert!(without.strips[0].crop_base64.is_none());

    let with = pipeline.run(&png_bytes(30, 30), true).unwrap();
    let uri = with.strips[0].crop_base64.as_deref().unwrap();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
}
