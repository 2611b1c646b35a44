// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalization of raw recognizer text
//!
//! Recognizers emit text with HTML entities, stray control bytes and
//! irregular whitespace. `normalize` turns it into a single canonical line.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};

/// Named (`&amp;`), decimal (`&#38;`) and hex (`&#x26;`) character references
///
/// The trailing `;` is optional here; whether a reference without it resolves
/// is decided in `resolve_reference`.
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]{0,31})(;?)")
        .expect("entity pattern is valid")
});

/// Named references HTML5 still resolves without a trailing semicolon
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren", "deg",
    "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34", "gt",
    "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// windows-1252 characters for numeric references 0x80-0x9F
///
/// The five undefined slots (0x81, 0x8D, 0x8F, 0x90, 0x9D) keep their C1
/// value and are stripped later as controls.
const WINDOWS_1252_C1: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{8D}', '\u{017D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{9D}', '\u{017E}', '\u{0178}',
];

/// Canonicalize raw recognized text
///
/// Steps:
/// 1. Decode HTML character references (unknown ones are kept verbatim)
/// 2. Drop C0/C1 control characters that are not whitespace; the
///    information separators U+001C-U+001F become spaces
/// 3. Collapse whitespace runs to a single ASCII space and trim
///
/// Steps 1 and 2 repeat until nothing changes, so doubly escaped input such as
/// `&amp;lt;` resolves fully and `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut current = strip_controls(raw);
    loop {
        let decoded = decode_entities(&current);
        if let Cow::Borrowed(_) = decoded {
            break;
        }
        let next = strip_controls(&decoded);
        if next == current {
            break;
        }
        current = next;
    }

    collapse_whitespace(&current)
}

/// Decode every resolvable character reference in `input`
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    ENTITY_PATTERN.replace_all(input, |caps: &Captures| {
        resolve_reference(&caps[1], !caps[2].is_empty()).unwrap_or_else(|| caps[0].to_string())
    })
}

fn resolve_reference(body: &str, terminated: bool) -> Option<String> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };
        // Overflowing references are out of range like any value past U+10FFFF
        return Some(numeric_reference(code.unwrap_or(u32::MAX)));
    }

    if terminated {
        if let Some(decoded) = resolve_html5_entity(body) {
            return Some(decoded.to_string());
        }
    }

    // Longest legacy name prefix, e.g. `&copy2025` or `&notit;`
    (2..=body.len()).rev().find_map(|end| {
        let name = &body[..end];
        if !LEGACY_ENTITIES.contains(&name) {
            return None;
        }
        let decoded = resolve_html5_entity(name)?;
        let tail = if terminated { ";" } else { "" };
        Some(format!("{}{}{}", decoded, &body[end..], tail))
    })
}

/// Character for a numeric reference, following the HTML5 parsing rules
fn numeric_reference(code: u32) -> String {
    match code {
        0 | 0xD800..=0xDFFF | 0x110000..=u32::MAX => char::REPLACEMENT_CHARACTER.to_string(),
        0x80..=0x9F => WINDOWS_1252_C1[(code - 0x80) as usize].to_string(),
        _ if is_disallowed_code_point(code) => String::new(),
        _ => char::from_u32(code)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
    }
}

/// Control and noncharacter code points that decode to nothing
fn is_disallowed_code_point(code: u32) -> bool {
    matches!(code, 0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F | 0xFDD0..=0xFDEF)
        || (code & 0xFFFE) == 0xFFFE
}

/// Remove control characters (0x00-0x1F, 0x7F-0x9F) except whitespace;
/// U+001C-U+001F separate words like whitespace does
fn strip_controls(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '\u{1C}'..='\u{1F}' => Some(' '),
            c if c.is_control() && !c.is_whitespace() => None,
            c => Some(c),
        })
        .collect()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
