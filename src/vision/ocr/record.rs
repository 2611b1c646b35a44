// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw recognizer line records and their canonical parsed form
//!
//! Recognizer versions disagree on the per-line layout:
//!
//! ```text
//! [polygon, [text, confidence]]            scored line
//! [polygon, [[text, confidence], ...]]     nested candidate list
//! [polygon, text]                          bare text, no confidence
//! [polygon, <anything else>]               unreadable, polygon only
//! ```
//!
//! `RawLineRecord` models those shapes explicitly and `parse_line` folds any of
//! them into a `ParsedLine` without failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::text::{normalize, tokenize};
use crate::vision::geometry::{polygon_bounds, BoundingBox, Point};

/// Records that cannot even provide a polygon
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("line record must be a JSON array or object, got {0}")]
    NotARecord(&'static str),

    #[error("line record has no polygon")]
    MissingPolygon,

    #[error("polygon point {0} is not a pair of numbers")]
    InvalidPoint(usize),
}

/// One text/confidence alternative from a nested candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub confidence: Option<f32>,
}

/// A recognizer line in one of the observed layouts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum RawLineRecord {
    /// `(polygon, (text, confidence))`
    Scored {
        polygon: Vec<Point>,
        text: String,
        confidence: Option<f32>,
    },
    /// `(polygon, [(text, confidence), ...])`; the first candidate wins
    Candidates {
        polygon: Vec<Point>,
        candidates: Vec<Candidate>,
    },
    /// `(polygon, text)` with no confidence
    Bare { polygon: Vec<Point>, text: String },
    /// Legacy or unknown layout; only the polygon is usable
    Unreadable { polygon: Vec<Point> },
}

impl RawLineRecord {
    pub fn polygon(&self) -> &[Point] {
        match self {
            RawLineRecord::Scored { polygon, .. }
            | RawLineRecord::Candidates { polygon, .. }
            | RawLineRecord::Bare { polygon, .. }
            | RawLineRecord::Unreadable { polygon } => polygon,
        }
    }

    /// Classify a JSON line record
    ///
    /// Besides the array layouts, objects of the form
    /// `{"polygon": .., "text": .., "confidence": ..}` are accepted as scored
    /// lines. Only a missing or malformed polygon is an error; any other
    /// irregularity degrades to `Bare` or `Unreadable`.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::Array(items) => {
                let polygon = parse_polygon(items.first().ok_or(RecordError::MissingPolygon)?)?;
                Ok(classify_payload(polygon, items.get(1)))
            }
            Value::Object(map) => {
                let polygon = parse_polygon(map.get("polygon").ok_or(RecordError::MissingPolygon)?)?;
                Ok(match map.get("text") {
                    Some(Value::String(text)) => RawLineRecord::Scored {
                        polygon,
                        text: text.clone(),
                        confidence: map.get("confidence").and_then(parse_confidence),
                    },
                    _ => RawLineRecord::Unreadable { polygon },
                })
            }
            other => Err(RecordError::NotARecord(json_kind(other))),
        }
    }
}

impl TryFrom<Value> for RawLineRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        RawLineRecord::from_value(&value)
    }
}

/// Canonical form of a recognized line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Normalized text (may be empty)
    pub text: String,
    pub confidence: Option<f32>,
    pub tokens: Vec<String>,
    /// Integer bounding box of the line polygon, in crop coordinates
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Fold any raw record into a `ParsedLine`
///
/// Never fails: unreadable payloads yield empty text and no confidence while
/// the polygon still provides the box.
pub fn parse_line(record: &RawLineRecord) -> ParsedLine {
    let (raw_text, confidence) = match record {
        RawLineRecord::Scored {
            text, confidence, ..
        } => (text.as_str(), *confidence),
        RawLineRecord::Candidates { candidates, .. } => candidates
            .first()
            .map(|c| (c.text.as_str(), c.confidence))
            .unwrap_or(("", None)),
        RawLineRecord::Bare { text, .. } => (text.as_str(), None),
        RawLineRecord::Unreadable { .. } => ("", None),
    };

    let text = normalize(raw_text);
    // tokenize normalizes again; normalize is idempotent so this is stable
    let tokens = tokenize(&text);

    ParsedLine {
        text,
        confidence: confidence.filter(|c| c.is_finite()),
        tokens,
        bbox: polygon_bounds(record.polygon()),
    }
}

fn classify_payload(polygon: Vec<Point>, payload: Option<&Value>) -> RawLineRecord {
    match payload {
        // [text, confidence]
        Some(Value::Array(pair)) if matches!(pair.first(), Some(Value::String(_))) => {
            match parse_scored_pair(pair) {
                Some(candidate) => RawLineRecord::Scored {
                    polygon,
                    text: candidate.text,
                    confidence: candidate.confidence,
                },
                None => RawLineRecord::Unreadable { polygon },
            }
        }
        // [[text, confidence], ...]
        Some(Value::Array(list)) if matches!(list.first(), Some(Value::Array(_))) => {
            let first = list.first().and_then(Value::as_array).and_then(|p| parse_scored_pair(p));
            match first {
                Some(first) => {
                    let rest = list
                        .iter()
                        .skip(1)
                        .filter_map(Value::as_array)
                        .filter_map(|p| parse_scored_pair(p));
                    RawLineRecord::Candidates {
                        polygon,
                        candidates: std::iter::once(first).chain(rest).collect(),
                    }
                }
                None => RawLineRecord::Unreadable { polygon },
            }
        }
        Some(Value::String(text)) => RawLineRecord::Bare {
            polygon,
            text: text.clone(),
        },
        _ => RawLineRecord::Unreadable { polygon },
    }
}

/// `[text, confidence]`; exactly two elements with a string first
fn parse_scored_pair(pair: &[Value]) -> Option<Candidate> {
    match pair {
        [Value::String(text), confidence] => Some(Candidate {
            text: text.clone(),
            confidence: parse_confidence(confidence),
        }),
        _ => None,
    }
}

/// Numbers and numeric strings convert; anything else is no confidence
fn parse_confidence(value: &Value) -> Option<f32> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    let number = number as f32;
    number.is_finite().then_some(number)
}

fn parse_polygon(value: &Value) -> Result<Vec<Point>, RecordError> {
    let points = value.as_array().ok_or(RecordError::MissingPolygon)?;
    if points.is_empty() {
        return Err(RecordError::MissingPolygon);
    }

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let coords = point.as_array().ok_or(RecordError::InvalidPoint(i))?;
            match coords.as_slice() {
                [x, y, ..] => Ok([
                    x.as_f64().ok_or(RecordError::InvalidPoint(i))?,
                    y.as_f64().ok_or(RecordError::InvalidPoint(i))?,
                ]),
                _ => Err(RecordError::InvalidPoint(i)),
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
