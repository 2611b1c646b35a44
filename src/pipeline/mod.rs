// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-to-OCR aggregation pipeline
//!
//! bytes → image → detector → crops → recognizer → parsed lines → regions

pub mod aggregator;
pub mod orchestrator;
pub mod types;

pub use aggregator::aggregate_region;
pub use orchestrator::{detect_only, PipelineError, StripPipeline};
pub use types::{
    DetectOnlyResponse, DetectionResponse, DropReason, ImageMeta, ModelMeta, PipelineReport,
    PipelineSettings, RegionFailure, RegionOutcome, RegionResult, RegionText,
};
