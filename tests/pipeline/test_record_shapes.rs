// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Recognizer output layouts seen across OCR library versions

use medstrip_ocr::vision::{
    ocr::{parse_line, RecordError},
    BoundingBox, RawLineRecord,
};
use serde_json::json;

#[test]
fn test_batch_of_mixed_layouts_deserializes() {
    let raw = r#"[
        [[[10.2, 4.9], [80.7, 5.1], [80.2, 20.0], [10.0, 19.8]], ["Ibuprofen", 0.93]],
        [[[10, 22], [60, 22], [60, 35], [10, 35]], [["400mg", 0.88]]],
        [[[10, 40], [60, 40], [60, 50], [10, 50]], "Tablets"],
        [[[10, 52], [60, 52], [60, 60], [10, 60]], {"legacy": true}]
    ]"#;

    let records: Vec<RawLineRecord> = serde_json::from_str(raw).unwrap();
    let lines: Vec<_> = records.iter().map(parse_line).collect();

    assert_eq!(lines[0].bbox, BoundingBox::new(10, 4, 80, 20));
    assert_eq!(lines[0].tokens, vec!["ibuprofen"]);
    assert_eq!(lines[1].confidence, Some(0.88));
    assert_eq!(lines[2].text, "Tablets");
    assert_eq!(lines[3].text, "");
    assert_eq!(lines[3].bbox, BoundingBox::new(10, 52, 60, 60));
}

#[test]
fn test_record_without_polygon_rejected_by_serde() {
    let result: Result<Vec<RawLineRecord>, _> = serde_json::from_value(json!([[null, ["x", 0.5]]]));
    assert!(result.is_err());

    assert_eq!(
        RawLineRecord::from_value(&json!([null, ["x", 0.5]])).unwrap_err(),
        RecordError::MissingPolygon
    );
}

#[test]
fn test_entities_and_controls_in_recognized_text() {
    let record = RawLineRecord::from_value(&json!([
        [[0, 0], [1, 0], [1, 1], [0, 1]],
        ["Co-Amoxiclav&nbsp;&amp;\u{0007} Clavulanate&#x20;&#9;625", 0.7]
    ]))
    .unwrap();

    let line = parse_line(&record);
    assert_eq!(line.text, "Co-Amoxiclav & Clavulanate 625");
    assert_eq!(line.tokens, vec!["co-amoxiclav", "clavulanate", "625"]);
}
