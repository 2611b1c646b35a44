// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::detect::{detect_full_handler, detect_handler};
use super::ApiError;
use crate::config::ServiceConfig;
use crate::pipeline::PipelineSettings;
use crate::version;
use crate::vision::ModelRegistry;

/// Room for multipart framing and text fields on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub settings: PipelineSettings,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(registry: ModelRegistry, config: &ServiceConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            settings: PipelineSettings::from_config(config),
            request_timeout: config.request_timeout(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Strip detection only
        .route("/detect", post(detect_handler))
        // Detection + OCR
        .route("/detect_full", post(detect_full_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: ServiceConfig, registry: ModelRegistry) -> anyhow::Result<()> {
    let addr: SocketAddr = config.listen_addr;
    let app = build_router(AppState::new(registry, &config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": version::VERSION_NUMBER,
        "features": version::FEATURES,
        "models": state.registry.list_models(),
    }))
}

/// Run blocking inference on the blocking pool, bounded by `timeout`
///
/// On timeout the worker is left to finish in the background; its result is
/// discarded.
pub(crate) async fn run_blocking<T, F>(timeout: Duration, task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(task)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ApiError::InternalError(format!(
            "Worker task failed: {}",
            join_error
        ))),
        Err(_) => Err(ApiError::Timeout),
    }
}
