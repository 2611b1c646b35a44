// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup loading of the strip detector and text recognizer

use std::sync::Arc;

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::pipeline::{PipelineSettings, StripPipeline};
use crate::vision::detection::{StripDetector, YoloStripDetector};
use crate::vision::ocr::{PaddleOcrRecognizer, TextRecognizer};

/// Availability of one model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub model_type: String,
    pub available: bool,
}

/// Holds whichever model backends loaded at startup
///
/// A backend that fails to load is logged and left empty so the service can
/// still answer `/health`; requests needing it get 503.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    detector: Option<Arc<dyn StripDetector>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    detector_id: String,
    recognizer_id: String,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("detector", &self.detector.is_some())
            .field("recognizer", &self.recognizer.is_some())
            .finish()
    }
}

impl ModelRegistry {
    /// Load both backends from `config`
    ///
    /// Blocking: model files are read and ONNX sessions built here.
    pub fn load(config: &ServiceConfig) -> Self {
        let detector = match YoloStripDetector::new(&config.detector) {
            Ok(model) => {
                tracing::info!("✅ Strip detector loaded from {}", config.detector.model_path.display());
                Some(Arc::new(model) as Arc<dyn StripDetector>)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Failed to load strip detector from {}: {:#}",
                    config.detector.model_path.display(),
                    e
                );
                None
            }
        };

        let recognizer = match PaddleOcrRecognizer::new(&config.recognizer) {
            Ok(model) => {
                tracing::info!(
                    "✅ PaddleOCR recognizer loaded from {} (language: {})",
                    config.recognizer.model_dir.display(),
                    model.language()
                );
                Some(Arc::new(model) as Arc<dyn TextRecognizer>)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Failed to load OCR models from {}: {:#}",
                    config.recognizer.model_dir.display(),
                    e
                );
                None
            }
        };

        Self {
            detector,
            recognizer,
            detector_id: config.detector.model_id.clone(),
            recognizer_id: config.recognizer.model_id.clone(),
        }
    }

    /// Registry over already constructed backends
    pub fn from_parts(
        detector: Option<Arc<dyn StripDetector>>,
        recognizer: Option<Arc<dyn TextRecognizer>>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            detector,
            recognizer,
            detector_id: settings.detector_model.clone(),
            recognizer_id: settings.recognizer_model.clone(),
        }
    }

    pub fn detector(&self) -> Option<Arc<dyn StripDetector>> {
        self.detector.clone()
    }

    pub fn recognizer(&self) -> Option<Arc<dyn TextRecognizer>> {
        self.recognizer.clone()
    }

    /// Full pipeline, if both backends are available
    pub fn strip_pipeline(&self, settings: PipelineSettings) -> Option<StripPipeline> {
        Some(StripPipeline::new(self.detector()?, self.recognizer()?, settings))
    }

    pub fn list_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                name: self.detector_id.clone(),
                model_type: "detector".to_string(),
                available: self.detector.is_some(),
            },
            ModelInfo {
                name: self.recognizer_id.clone(),
                model_type: "ocr".to_string(),
                available: self.recognizer.is_some(),
            },
        ]
    }
}
