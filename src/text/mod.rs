// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text canonicalization for recognized strip text
//!
//! - `normalize` - entity decoding, control stripping, whitespace collapsing
//! - `tokenize` - token extraction for downstream drug-name matching

pub mod normalize;
pub mod tokenize;

pub use normalize::normalize;
pub use tokenize::tokenize;
