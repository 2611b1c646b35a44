// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Idempotence and totality over a generated corpus of awkward inputs

use medstrip_ocr::text::{normalize, tokenize};

const FRAGMENTS: &[&str] = &[
    "", " ", "\t", "\n", "\r\n", "\u{00A0}", "\u{0085}", "\u{0000}", "\u{001B}", "\u{009F}",
    "&", "&amp;", "&amp;amp;", "&lt;", "&#", "&#x;", "&#1114112;", "&#0;", "&#x9;", "&#10;",
    "&notanentity;", "&nbsp", "&#x1F48A;", "Panadol", "500mg", "10%", "-", "دواء", "ڤ",
    "ΑΒΓ", "\u{200B}", "\u{FEFF}", "ÄÖÜ", "x&#x26;amp;y", "&#150;", "&#x81;", "&amp", "&lt",
    "&copy", "\u{001F}", "&#31;",
];

fn corpus() -> impl Iterator<Item = String> {
    FRAGMENTS.iter().flat_map(|a| {
        FRAGMENTS.iter().flat_map(move |b| {
            FRAGMENTS
                .iter()
                .step_by(3)
                .map(move |c| format!("{}{}{}", a, b, c))
        })
    })
}

#[test]
fn test_normalize_is_idempotent() {
    for input in corpus() {
        let once = normalize(&input);
        assert_eq!(normalize(&once), once, "input {:?}", input);
    }
}

#[test]
fn test_normalized_text_is_canonical() {
    for input in corpus() {
        let out = normalize(&input);
        assert_eq!(out.trim(), out, "input {:?}", input);
        assert!(!out.contains("  "), "input {:?}", input);
        assert!(
            !out.chars().any(|c| c.is_control()),
            "control char left in {:?} from {:?}",
            out,
            input
        );
        assert!(
            !out.chars().any(|c| c.is_whitespace() && c != ' '),
            "non-space whitespace left in {:?}",
            out
        );
    }
}

#[test]
fn test_tokenize_is_total_and_stable() {
    for input in corpus() {
        let tokens = tokenize(&input);
        assert!(tokens.iter().all(|t| !t.is_empty()), "input {:?}", input);
        assert_eq!(tokenize(&normalize(&input)), tokens, "input {:?}", input);
        assert!(tokens.iter().all(|t| !t.chars().any(|c| c.is_ascii_uppercase())));
    }
}

#[test]
fn test_double_escape_resolves_fully() {
    assert_eq!(normalize("x&#x26;amp;y"), "x&y");
    assert_eq!(normalize("&amp;lt;b&amp;gt;"), "<b>");
}
