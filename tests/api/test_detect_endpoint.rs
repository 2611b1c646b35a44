// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect tests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use medstrip_ocr::api::build_router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use crate::common::{
    app_state, app_state_with_timeout, multipart_body, multipart_content_type, png_bytes,
    FailingDetector, Part, StubDetector,
};

async fn post(app: Router, body: Vec<u8>, content_type: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_detect_returns_detections() {
    let detector = Arc::new(StubDetector::with_boxes(&[[10, 10, 200, 200], [0, 0, 5, 5]]));
    let app = build_router(app_state(Some(detector.clone()), None));

    let png = png_bytes(64, 48);
    let (status, body) = post(app, multipart_body(&[Part::File("file", &png)]), &multipart_content_type()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detections"].as_array().unwrap().len(), 2);
    // Detector coordinates are reported unclamped
    assert_eq!(body["detections"][0]["box"], json!([10, 10, 200, 200]));
    assert_eq!(body["detections"][0]["class_name"], "medicine_strip");
    assert_eq!(body["meta"]["detector_model"], "medstrip_yolo_v1");
    assert_eq!(body["meta"]["img_size"], 640);
    assert!(body["meta"].get("recognizer_model").is_none());
    assert_eq!(detector.calls(), 1);
}

#[tokio::test]
async fn test_detect_missing_file_field() {
    let detector = Arc::new(StubDetector::default());
    let app = build_router(app_state(Some(detector.clone()), None));

    let body = multipart_body(&[Part::Text("image", "not the right field")]);
    let (status, body) = post(app, body, &multipart_content_type()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No file provided", "details": null}));
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_detect_non_multipart_body() {
    let app = build_router(app_state(Some(Arc::new(StubDetector::default())), None));
    let (status, body) = post(app, b"{}".to_vec(), "application/json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn test_detect_invalid_image() {
    let detector = Arc::new(StubDetector::with_boxes(&[[0, 0, 1, 1]]));
    let app = build_router(app_state(Some(detector.clone()), None));

    let body = multipart_body(&[Part::File("file", b"definitely not an image")]);
    let (status, body) = post(app, body, &multipart_content_type()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid image file");
    assert_eq!(body["details"], "Unsupported image format");
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_detect_without_detector_is_503() {
    let app = build_router(app_state(None, None));
    let png = png_bytes(8, 8);
    let (status, body) = post(app, multipart_body(&[Part::File("file", &png)]), &multipart_content_type()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service unavailable");
}

#[tokio::test]
async fn test_detect_detector_failure_is_500() {
    let app = build_router(app_state(Some(Arc::new(FailingDetector)), None));
    let png = png_bytes(8, 8);
    let (status, body) = post(app, multipart_body(&[Part::File("file", &png)]), &multipart_content_type()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Detection failed");
    assert!(body["details"].as_str().unwrap().contains("unexpected shape"));
}

#[tokio::test]
async fn test_detect_timeout_is_504() {
    let detector = Arc::new(StubDetector {
        delay: Some(Duration::from_millis(500)),
        ..StubDetector::default()
    });
    let app = build_router(app_state_with_timeout(Some(detector), None, Duration::from_millis(50)));
    let png = png_bytes(8, 8);
    let (status, body) = post(app, multipart_body(&[Part::File("file", &png)]), &multipart_content_type()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, json!({"error": "Request timed out", "details": null}));
}
