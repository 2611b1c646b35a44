// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tokenization of normalized strip text

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;

/// Token-internal characters: Unicode word characters, `%`, `-`, and the
/// Arabic (U+0600-06FF), Arabic Supplement (U+0750-077F) and
/// Arabic Extended-A (U+08A0-08FF) blocks used by Urdu labels.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{0600}-\x{06FF}\x{0750}-\x{077F}\x{08A0}-\x{08FF}\w%\-]+")
        .expect("token pattern is valid")
});

/// Split raw text into tokens
///
/// The text is normalized first and ASCII letters are lower-cased; other
/// scripts pass through unchanged. Tokens keep their order of appearance
/// and duplicates are retained. Characters outside the token set only act as
/// separators, so this never fails.
pub fn tokenize(raw: &str) -> Vec<String> {
    let normalized = normalize(raw).to_ascii_lowercase();

    TOKEN_PATTERN
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}
