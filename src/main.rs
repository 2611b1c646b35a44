// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use medstrip_ocr::{api::start_server, cli::Cli, version, vision::ModelRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    tracing::info!("🚀 Starting {}", version::get_version_string());
    tracing::info!(
        "Detector: {} ({}), OCR: {} ({}, language {})",
        config.detector.model_id,
        config.detector.model_path.display(),
        config.recognizer.model_id,
        config.recognizer.model_dir.display(),
        config.recognizer.language
    );

    let registry = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || ModelRegistry::load(&config)).await?
    };

    for model in registry.list_models() {
        if !model.available {
            tracing::warn!("⚠️ {} ({}) unavailable; dependent endpoints return 503", model.name, model.model_type);
        }
    }

    start_server(config, registry).await
}
