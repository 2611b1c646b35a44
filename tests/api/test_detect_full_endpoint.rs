// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect_full tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use medstrip_ocr::api::build_router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use crate::common::{
    app_state, multipart_body, multipart_content_type, png_bytes, Part, StubDetector, StubRecognizer,
};

async fn post(app: Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn full_app(boxes: &[[i64; 4]], lines: Vec<Value>) -> (Router, Arc<StubDetector>, Arc<StubRecognizer>) {
    let detector = Arc::new(StubDetector::with_boxes(boxes));
    let recognizer = Arc::new(StubRecognizer::with_lines(lines));
    let app = build_router(app_state(Some(detector.clone()), Some(recognizer.clone())));
    (app, detector, recognizer)
}

fn panadol() -> Value {
    json!([[[0, 0], [5, 0], [5, 5], [0, 5]], ["Panadol  500mg", 0.97]])
}

#[tokio::test]
async fn test_detect_full_response_shape() {
    let (app, _, _) = full_app(&[[10, 10, 200, 200], [150, 150, 200, 200]], vec![panadol()]);
    let png = png_bytes(100, 100);

    let (status, body) = post(app, "/detect_full", multipart_body(&[Part::File("file", &png)])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_meta"], json!({"width": 100, "height": 100}));
    assert_eq!(body["meta"]["detector_model"], "medstrip_yolo_v1");
    assert_eq!(body["meta"]["recognizer_model"], "paddleocr");
    assert_eq!(body["meta"]["recognizer_language"], "en");

    let strips = body["strips"].as_array().unwrap();
    assert_eq!(strips.len(), 1, "out-of-bounds detection is omitted");

    let strip = &strips[0];
    assert_eq!(strip["detection"]["box"], json!([10, 10, 200, 200]));
    assert_eq!(strip["crop_box"], json!([10, 10, 100, 100]));
    assert_eq!(strip["crop_base64"], Value::Null);
    assert_eq!(
        strip["ocr"],
        json!({
            "lines": [{
                "text": "Panadol 500mg",
                "confidence": 0.97,
                "tokens": ["panadol", "500mg"],
                "box": [0, 0, 5, 5]
            }],
            "aggregated_text": "Panadol 500mg",
            "aggregated_tokens": ["panadol", "500mg"]
        })
    );
}

#[tokio::test]
async fn test_return_crops_query_parameter() {
    let (app, _, _) = full_app(&[[0, 0, 20, 20]], vec![]);
    let png = png_bytes(32, 32);

    let (status, body) = post(
        app,
        "/detect_full?return_crops=true",
        multipart_body(&[Part::File("file", &png)]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let crop = body["strips"][0]["crop_base64"].as_str().unwrap();
    assert!(crop.starts_with("data:image/jpeg;base64,"));
    assert_eq!(body["strips"][0]["ocr"]["lines"], json!([]));
}

#[tokio::test]
async fn test_return_crops_form_field() {
    let (app, _, _) = full_app(&[[0, 0, 20, 20]], vec![]);
    let png = png_bytes(32, 32);

    let body = multipart_body(&[Part::Text("return_crops", "yes"), Part::File("file", &png)]);
    let (status, body) = post(app, "/detect_full", body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["strips"][0]["crop_base64"].is_string());
}

#[tokio::test]
async fn test_invalid_return_crops_value() {
    let (app, detector, _) = full_app(&[[0, 0, 20, 20]], vec![]);
    let png = png_bytes(32, 32);

    let (status, body) = post(
        app,
        "/detect_full?return_crops=sometimes",
        multipart_body(&[Part::File("file", &png)]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request");
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_invalid_image_never_reaches_models() {
    let (app, detector, recognizer) = full_app(&[[0, 0, 20, 20]], vec![panadol()]);
    let truncated_png = &png_bytes(16, 16)[..24];

    let (status, body) = post(app, "/detect_full", multipart_body(&[Part::File("file", truncated_png)])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid image file");
    assert!(body["details"].as_str().unwrap().starts_with("Failed to decode image"));
    assert_eq!(detector.calls(), 0);
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_recognizer_failure_keeps_region() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 16, 16], [16, 0, 32, 16]]));
    let recognizer = Arc::new(StubRecognizer {
        lines: vec![panadol()],
        fail_on: vec![2],
        ..StubRecognizer::default()
    });
    let app = build_router(app_state(Some(detector), Some(recognizer)));
    let png = png_bytes(32, 16);

    let (status, body) = post(app, "/detect_full", multipart_body(&[Part::File("file", &png)])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strips"][0]["ocr"]["aggregated_text"], "Panadol 500mg");
    assert_eq!(body["strips"][1]["ocr"]["lines"], json!([]));
    assert_eq!(body["strips"][1]["ocr"]["aggregated_text"], "");
}

#[tokio::test]
async fn test_detect_full_requires_recognizer() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 4, 4]]));
    let app = build_router(app_state(Some(detector), None));
    let png = png_bytes(8, 8);

    let (status, body) = post(app, "/detect_full", multipart_body(&[Part::File("file", &png)])).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["details"].as_str().unwrap().contains("not loaded"));
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let (app, detector, _) = full_app(&[[0, 0, 4, 4]], vec![]);
    let huge = vec![0x89u8; 11 * 1024 * 1024];

    let request = Request::builder()
        .method(Method::POST)
        .uri("/detect_full")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(&[Part::File("file", &huge)])))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(detector.calls(), 0);
}
