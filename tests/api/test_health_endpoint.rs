// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use medstrip_ocr::api::build_router;
use tower::util::ServiceExt;

use crate::common::{app_state, StubDetector};

async fn get_health(app: axum::Router) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_ok_without_models() {
    let (status, body) = get_health(build_router(app_state(None, None))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["models"][0]["available"], false);
    assert_eq!(body["models"][1]["available"], false);
}

#[tokio::test]
async fn test_health_reports_loaded_models() {
    let detector = Arc::new(StubDetector::default());
    let (status, body) = get_health(build_router(app_state(Some(detector), None))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"][0]["name"], "medstrip_yolo_v1");
    assert_eq!(body["models"][0]["available"], true);
    assert_eq!(body["models"][1]["model_type"], "ocr");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_router(app_state(None, None));
    let request = Request::builder()
        .method(Method::GET)
        .uri("/v1/models")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
