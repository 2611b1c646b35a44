// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect API endpoint module
//!
//! Provides POST /detect and POST /detect_full for medicine-strip uploads.

pub mod handler;
pub mod request;

pub use handler::{detect_full_handler, detect_handler};
pub use request::{parse_flag, DetectFullParams, UploadForm};
