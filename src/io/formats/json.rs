//! JSON codec.
//!
//! Output is a pretty-printed bundle object with `version`, `exportedAt`,
//! `mode`, optional `fileKey`, and a `problems` array. The parser also
//! accepts a bare array of records and legacy key spellings (`exportType`,
//! `listId`, `progressData`, `problemData`).

use super::{Codec, Format, ParsedBundle};
use crate::io::fields::{self, Field, canonical_key};
use crate::io::mode::detect_mode_from_fields;
use crate::models::{BundleRecord, ExportBundle, Mode};
use serde_json::Value;

/// JSON codec.
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn serialize(&self, bundle: &ExportBundle) -> String {
        // Serializing plain data to a String cannot fail.
        serde_json::to_string_pretty(bundle).unwrap_or_default()
    }

    fn parse(&self, text: &str) -> ParsedBundle {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => bundle_from_value(&value),
            Err(e) => ParsedBundle::malformed(e.to_string()),
        }
    }
}

/// Builds a bundle from a decoded JSON document.
///
/// Shared with the YAML codec, which decodes into the same value model.
pub(super) fn bundle_from_value(value: &Value) -> ParsedBundle {
    match value {
        Value::Array(rows) => {
            let records = records_from_rows(rows);
            let mode = detect_mode_from_fields(records.first());
            ParsedBundle {
                file_key: None,
                mode: Some(mode),
                records,
                error: None,
            }
        }
        Value::Object(map) => {
            let file_key = ["fileKey", "listId"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(Value::as_str)
                .map(str::to_string);
            // Unknown mode tokens fall back to full rather than failing.
            let declared = ["mode", "exportType"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(Value::as_str)
                .map(|raw| Mode::parse(raw).unwrap_or_default());
            let records = ["problems", "progressData", "problemData"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(Value::as_array)
                .map(|rows| records_from_rows(rows))
                .unwrap_or_default();
            let mode = declared.unwrap_or_else(|| detect_mode_from_fields(records.first()));
            ParsedBundle {
                file_key,
                mode: Some(mode),
                records,
                error: None,
            }
        }
        _ => ParsedBundle::malformed("expected an object or array of records"),
    }
}

fn records_from_rows(rows: &[Value]) -> Vec<BundleRecord> {
    rows.iter().filter_map(record_from_value).collect()
}

/// Converts one decoded row into a record, or `None` for nameless rows
/// and non-object values.
pub(super) fn record_from_value(value: &Value) -> Option<BundleRecord> {
    let map = value.as_object()?;
    let mut record = BundleRecord::default();
    for (key, value) in map {
        match Field::parse(key) {
            Some(field) => match value {
                Value::String(s) => fields::apply_field(&mut record, field, s),
                Value::Bool(b) => {
                    fields::apply_field(&mut record, field, if *b { "true" } else { "false" });
                }
                Value::Number(n) => fields::apply_field(&mut record, field, &n.to_string()),
                _ => {}
            },
            None => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => continue,
                    other => other.to_string(),
                };
                record.extras.insert(canonical_key(key), text);
            }
        }
    }
    (!record.name.is_empty()).then_some(record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    #[test]
    fn serializes_bundle_envelope() {
        let mut record = BundleRecord::new("Two Sum");
        record.difficulty = Some(Difficulty::Easy);
        let bundle = ExportBundle::new(Mode::Problems, vec![record]).with_list_id("blind_75");

        let text = JsonCodec.serialize(&bundle);
        assert!(text.contains("\"version\": 1"));
        assert!(text.contains("\"exportedAt\":"));
        assert!(text.contains("\"mode\": \"problems\""));
        assert!(text.contains("\"fileKey\": \"blind_75\""));
        assert!(text.contains("\"problems\": ["));
        assert!(text.contains("\"name\": \"Two Sum\""));
    }

    #[test]
    fn file_key_is_omitted_when_absent() {
        let bundle = ExportBundle::new(Mode::Full, vec![BundleRecord::new("Two Sum")]);
        assert!(!JsonCodec.serialize(&bundle).contains("fileKey"));
    }

    #[test]
    fn extras_are_flattened_into_rows() {
        let mut record = BundleRecord::new("Two Sum");
        record.extras.insert("review_count".to_string(), "3".to_string());
        let text = JsonCodec.serialize(&ExportBundle::new(Mode::Full, vec![record]));
        assert!(text.contains("\"review_count\": \"3\""));
    }

    #[test]
    fn parses_full_envelope_roundtrip() {
        let mut record = BundleRecord::new("Two Sum");
        record.solved = Some(true);
        record.time_to_solve = Some(25);
        let bundle = ExportBundle::new(Mode::User, vec![record]).with_list_id("blind_75");

        let parsed = JsonCodec.parse(&JsonCodec.serialize(&bundle));
        assert_eq!(parsed.file_key.as_deref(), Some("blind_75"));
        assert_eq!(parsed.mode, Some(Mode::User));
        assert_eq!(parsed.records[0].time_to_solve, Some(25));
        assert_eq!(parsed.records[0].solved, Some(true));
    }

    #[test]
    fn parses_bare_array() {
        let text = r#"[{"name": "Two Sum", "solved": true}, {"name": "Valid Anagram"}]"#;
        let parsed = JsonCodec.parse(text);
        assert_eq!(parsed.mode, Some(Mode::User));
        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.file_key.is_none());
    }

    #[test]
    fn accepts_legacy_keys_and_typed_values() {
        let text = r#"{
            "exportType": "progress_only",
            "listId": "neetcode_150",
            "progressData": [
                {"name": "Two Sum", "solved": true, "timeToSolve": 25, "lastModified": 1700000000000}
            ]
        }"#;
        let parsed = JsonCodec.parse(text);
        assert_eq!(parsed.mode, Some(Mode::User));
        assert_eq!(parsed.file_key.as_deref(), Some("neetcode_150"));
        assert_eq!(parsed.records[0].last_modified, Some(1_700_000_000_000));
    }

    #[test]
    fn unknown_mode_token_falls_back_to_full() {
        let parsed = JsonCodec.parse(r#"{"mode": "bogus", "problems": [{"name": "X"}]}"#);
        assert_eq!(parsed.mode, Some(Mode::Full));
    }

    #[test]
    fn unknown_row_keys_land_in_extras() {
        let parsed = JsonCodec.parse(r#"{"problems": [{"name": "X", "Review Count": 3}]}"#);
        assert_eq!(parsed.records[0].extras.get("review_count").map(String::as_str), Some("3"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let parsed = JsonCodec.parse("{not json");
        assert!(parsed.is_malformed());
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn scalar_document_is_malformed() {
        assert!(JsonCodec.parse("42").is_malformed());
    }

    #[test]
    fn nameless_rows_are_dropped() {
        let parsed = JsonCodec.parse(r#"{"problems": [{"solved": true}, {"name": "X"}]}"#);
        assert_eq!(parsed.records.len(), 1);
    }
}
