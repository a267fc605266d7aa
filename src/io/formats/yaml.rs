//! YAML codec.
//!
//! Output is a flat document: `fileKey`, `mode`, `version`, `exportDate`,
//! then a `problems` block sequence. String values are double-quoted only
//! when YAML would otherwise mangle them. Parsing decodes the document
//! into the same value model the JSON codec walks, so any YAML shaped
//! like the JSON dialect is accepted.

use super::json::bundle_from_value;
use super::{Codec, Format, ParsedBundle, export_date_rfc3339};
use crate::io::fields::{self, Field};
use crate::models::{BUNDLE_VERSION, BundleRecord, ExportBundle};
use std::fmt::Write as _;

/// YAML codec.
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn serialize(&self, bundle: &ExportBundle) -> String {
        let mut out = String::new();
        if let Some(list_id) = &bundle.list_id {
            let _ = writeln!(out, "fileKey: {}", scalar(list_id));
        }
        let _ = writeln!(out, "mode: {}", bundle.mode);
        let _ = writeln!(out, "version: {BUNDLE_VERSION}");
        let _ = writeln!(
            out,
            "exportDate: {}",
            scalar(&export_date_rfc3339(bundle.exported_at))
        );

        if bundle.records.is_empty() {
            out.push_str("problems: []\n");
            return out;
        }
        out.push_str("problems:\n");
        for record in &bundle.records {
            write_record(&mut out, record);
        }
        out
    }

    fn parse(&self, text: &str) -> ParsedBundle {
        if text.trim().is_empty() {
            return ParsedBundle::empty();
        }
        match serde_yaml_ng::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Null) => ParsedBundle::empty(),
            Ok(value) => bundle_from_value(&value),
            Err(e) => ParsedBundle::malformed(e.to_string()),
        }
    }
}

fn write_record(out: &mut String, record: &BundleRecord) {
    let _ = writeln!(out, "  - name: {}", scalar(&record.name));
    for field in Field::all() {
        if *field == Field::Name {
            continue;
        }
        if fields::field_is_set(record, *field) {
            let _ = writeln!(out, "    {}: {}", field.key(), field_scalar(record, *field));
        }
    }
    for (key, value) in &record.extras {
        let _ = writeln!(out, "    {key}: {}", scalar(value));
    }
}

/// Renders one field value. Numerics, booleans, and difficulty ratings
/// are always plain; free text goes through [`scalar`].
fn field_scalar(record: &BundleRecord, field: Field) -> String {
    let text = fields::field_text(record, field);
    match field {
        Field::Difficulty
        | Field::IntermediateTime
        | Field::AdvancedTime
        | Field::TopTime
        | Field::Solved
        | Field::TimeToSolve
        | Field::LastModified => text,
        _ => scalar(&text),
    }
}

/// Renders a string scalar, double-quoting when the plain form would be
/// misread by a YAML parser.
fn scalar(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn needs_quotes(value: &str) -> bool {
    if value.is_empty() || value.trim() != value {
        return true;
    }
    if value.starts_with([
        '-', '?', '>', '|', '*', '&', '!', '%', '@', '`', '"', '\'', '[', ']', '{', '}', ',',
    ]) {
        return true;
    }
    if value.contains([':', '#', '\n', '\r', '\t']) {
        return true;
    }
    // Plain scalars that resolve to null, bool, or number must be quoted
    // or a reader hands back the typed value instead of the string.
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "null" | "~" | "true" | "false") {
        return true;
    }
    if let Some(digits) = lower.strip_prefix("0x") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return true;
        }
    }
    if let Some(digits) = lower.strip_prefix("0o") {
        if !digits.is_empty() && digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return true;
        }
    }
    value.parse::<f64>().is_ok()
}
