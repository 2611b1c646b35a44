// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, ServiceConfig, CONFIG_PATH_ENV};

/// Medicine strip detection and OCR service
#[derive(Parser, Debug, Default)]
#[command(name = "medstrip-ocr")]
#[command(version)]
#[command(about = "HTTP service for medicine-strip detection and OCR", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Strip detector ONNX model
    #[arg(long)]
    pub detector_model: Option<PathBuf>,

    /// Directory with the PaddleOCR ONNX models and dictionaries
    #[arg(long)]
    pub ocr_model_dir: Option<PathBuf>,

    /// OCR recognition language
    #[arg(long)]
    pub language: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum accepted upload size in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl Cli {
    /// Build the effective configuration: defaults, file, environment, flags
    pub fn resolve_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        config.apply_env()?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(path) = &self.detector_model {
            config.detector.model_path = path.clone();
        }
        if let Some(dir) = &self.ocr_model_dir {
            config.recognizer.model_dir = dir.clone();
        }
        if let Some(language) = &self.language {
            config.recognizer.language = language.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(max) = self.max_upload_bytes {
            config.max_upload_bytes = max;
        }
    }
}
