// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the medicine strip OCR service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "strip-detection",
    "region-ocr",
    "html-entity-normalization",
    "arabic-script-tokens",
    "crop-preview",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("medstrip-ocr {}", VERSION_NUMBER)
}
