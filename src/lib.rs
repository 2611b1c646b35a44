// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod text;
pub mod version;
pub mod vision;

pub use config::{ConfigError, DetectorConfig, RecognizerConfig, ServiceConfig};
pub use pipeline::{DetectionResponse, PipelineError, PipelineSettings, StripPipeline};
pub use vision::{BoundingBox, Detection, ModelRegistry, RawLineRecord, StripDetector, TextRecognizer};
