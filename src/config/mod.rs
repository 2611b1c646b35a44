// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `MEDSTRIP_*` environment variables, then command-line flags.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::image_utils::DEFAULT_MAX_IMAGE_SIZE;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "MEDSTRIP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Strip detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    /// Class names by class index
    pub labels: Vec<String>,
    /// Square model input size
    pub img_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    /// Identifier reported in response metadata
    pub model_id: String,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/medstrip_yolo_v1.onnx"),
            labels: vec!["medicine_strip".to_string()],
            img_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            model_id: "medstrip_yolo_v1".to_string(),
            intra_threads: 4,
        }
    }
}

/// Text recognizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Directory holding det_model.onnx, rec_model.onnx and the dictionary
    pub model_dir: PathBuf,
    /// Recognition language; selects `<language>_dict.txt`
    pub language: String,
    pub model_id: String,
    /// Probability threshold for the text-line map
    pub det_threshold: f32,
    /// Turn upside-down lines with cls_model.onnx before recognition
    pub use_angle_cls: bool,
    /// Minimum 180° score before a line is rotated
    pub cls_threshold: f32,
    pub intra_threads: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models/paddleocr-onnx"),
            language: "en".to_string(),
            model_id: "paddleocr".to_string(),
            det_threshold: 0.3,
            use_angle_cls: true,
            cls_threshold: 0.9,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub detector: DetectorConfig,
    pub recognizer: RecognizerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 30,
            max_upload_bytes: DEFAULT_MAX_IMAGE_SIZE,
            detector: DetectorConfig::default(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`
    ///
    /// Recognized keys: `MEDSTRIP_LISTEN_ADDR`, `MEDSTRIP_REQUEST_TIMEOUT_SECS`,
    /// `MEDSTRIP_MAX_UPLOAD_BYTES`, `MEDSTRIP_DETECTOR_MODEL`,
    /// `MEDSTRIP_DETECTOR_LABELS` (comma separated), `MEDSTRIP_IMG_SIZE`,
    /// `MEDSTRIP_CONF_THRESHOLD`, `MEDSTRIP_IOU_THRESHOLD`,
    /// `MEDSTRIP_DETECTOR_MODEL_ID`, `MEDSTRIP_OCR_MODEL_DIR`,
    /// `MEDSTRIP_OCR_LANGUAGE`, `MEDSTRIP_OCR_MODEL_ID`,
    /// `MEDSTRIP_OCR_DET_THRESHOLD`, `MEDSTRIP_OCR_USE_ANGLE_CLS`,
    /// `MEDSTRIP_OCR_CLS_THRESHOLD`, `MEDSTRIP_INTRA_THREADS`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MEDSTRIP_LISTEN_ADDR") {
            self.listen_addr = parse_env("MEDSTRIP_LISTEN_ADDR", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("MEDSTRIP_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("MEDSTRIP_MAX_UPLOAD_BYTES", &v)?;
        }

        if let Some(v) = get("MEDSTRIP_DETECTOR_MODEL") {
            self.detector.model_path = PathBuf::from(v);
        }
        if let Some(v) = get("MEDSTRIP_DETECTOR_LABELS") {
            self.detector.labels = v
                .split(',')
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect();
        }
        if let Some(v) = get("MEDSTRIP_IMG_SIZE") {
            self.detector.img_size = parse_env("MEDSTRIP_IMG_SIZE", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_CONF_THRESHOLD") {
            self.detector.conf_threshold = parse_env("MEDSTRIP_CONF_THRESHOLD", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_IOU_THRESHOLD") {
            self.detector.iou_threshold = parse_env("MEDSTRIP_IOU_THRESHOLD", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_DETECTOR_MODEL_ID") {
            self.detector.model_id = v;
        }

        if let Some(v) = get("MEDSTRIP_OCR_MODEL_DIR") {
            self.recognizer.model_dir = PathBuf::from(v);
        }
        if let Some(v) = get("MEDSTRIP_OCR_LANGUAGE") {
            self.recognizer.language = v;
        }
        if let Some(v) = get("MEDSTRIP_OCR_MODEL_ID") {
            self.recognizer.model_id = v;
        }
        if let Some(v) = get("MEDSTRIP_OCR_DET_THRESHOLD") {
            self.recognizer.det_threshold = parse_env("MEDSTRIP_OCR_DET_THRESHOLD", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_OCR_USE_ANGLE_CLS") {
            self.recognizer.use_angle_cls = parse_env("MEDSTRIP_OCR_USE_ANGLE_CLS", &v)?;
        }
        if let Some(v) = get("MEDSTRIP_OCR_CLS_THRESHOLD") {
            self.recognizer.cls_threshold = parse_env("MEDSTRIP_OCR_CLS_THRESHOLD", &v)?;
        }

        if let Some(v) = get("MEDSTRIP_INTRA_THREADS") {
            let threads = parse_env("MEDSTRIP_INTRA_THREADS", &v)?;
            self.detector.intra_threads = threads;
            self.recognizer.intra_threads = threads;
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".into()));
        }

        let detector = &self.detector;
        if detector.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("detector.model_path is empty".into()));
        }
        if detector.img_size == 0 {
            return Err(ConfigError::Invalid("detector.img_size must be positive".into()));
        }
        check_unit_range("detector.conf_threshold", detector.conf_threshold)?;
        check_unit_range("detector.iou_threshold", detector.iou_threshold)?;
        if detector.model_id.trim().is_empty() {
            return Err(ConfigError::Invalid("detector.model_id is empty".into()));
        }

        let recognizer = &self.recognizer;
        if recognizer.model_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("recognizer.model_dir is empty".into()));
        }
        if recognizer.language.trim().is_empty() {
            return Err(ConfigError::Invalid("recognizer.language is empty".into()));
        }
        check_unit_range("recognizer.det_threshold", recognizer.det_threshold)?;
        check_unit_range("recognizer.cls_threshold", recognizer.cls_threshold)?;

        if detector.intra_threads == 0 || recognizer.intra_threads == 0 {
            return Err(ConfigError::Invalid("intra_threads must be positive".into()));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn check_unit_range(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, value)))
    }
}
