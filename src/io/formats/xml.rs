//! XML codec.
//!
//! Output is an `<export>` document with one element per record: present
//! fields as attributes, comments as a child element so multi-line notes
//! survive. The parser is a small tag scanner rather than a full XML
//! stack; it accepts attribute-style rows, child-element rows, and
//! documents missing the `<export>` root.

use super::{Codec, Format, ParsedBundle, export_date_rfc3339};
use crate::io::fields::{self, Field, canonical_key};
use crate::io::mode::detect_mode_from_fields;
use crate::models::{BUNDLE_VERSION, BundleRecord, ExportBundle, Mode};
use std::fmt::Write as _;

/// XML codec.
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn serialize(&self, bundle: &ExportBundle) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<export");
        if let Some(list_id) = &bundle.list_id {
            let _ = write!(out, " fileKey=\"{}\"", escape(list_id));
        }
        let _ = write!(out, " mode=\"{}\"", bundle.mode);
        let _ = write!(
            out,
            " exportDate=\"{}\"",
            export_date_rfc3339(bundle.exported_at)
        );
        let _ = write!(out, " version=\"{BUNDLE_VERSION}\"");
        out.push_str(">\n  <problems>\n");

        let element = if bundle.mode == Mode::User {
            "progress"
        } else {
            "problem"
        };
        for record in &bundle.records {
            write_row(&mut out, element, record);
        }

        out.push_str("  </problems>\n</export>\n");
        out
    }

    fn parse(&self, text: &str) -> ParsedBundle {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ParsedBundle::empty();
        }
        if !trimmed.starts_with('<') {
            return ParsedBundle::malformed("expected an XML document");
        }

        let mut file_key = None;
        let mut declared = None;
        let mut saw_export = false;
        let mut records = Vec::new();
        let mut cursor = 0;
        while let Some(token) = next_token(text, cursor) {
            match token {
                Token::Close { span_end, .. } => cursor = span_end,
                Token::Open {
                    name,
                    attributes,
                    self_closing,
                    span_end,
                } => {
                    cursor = span_end;
                    match name {
                        "export" => {
                            saw_export = true;
                            for (key, value) in parse_attributes(attributes) {
                                match key.as_str() {
                                    "fileKey" | "listId" => file_key = Some(value),
                                    "mode" | "exportType" => {
                                        declared = Some(Mode::parse(&value).unwrap_or_default());
                                    }
                                    _ => {}
                                }
                            }
                        }
                        "problem" | "progress" => {
                            let mut record = BundleRecord::default();
                            for (key, value) in parse_attributes(attributes) {
                                apply_entry(&mut record, &key, &value);
                            }
                            if !self_closing {
                                cursor = read_children(text, cursor, name, &mut record);
                            }
                            if !record.name.is_empty() {
                                records.push(record);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if records.is_empty() && !saw_export {
            return ParsedBundle::malformed("no export element or record rows found");
        }
        let mode = declared.unwrap_or_else(|| detect_mode_from_fields(records.first()));
        ParsedBundle {
            file_key,
            mode: Some(mode),
            records,
            error: None,
        }
    }
}

fn write_row(out: &mut String, element: &str, record: &BundleRecord) {
    let _ = write!(out, "    <{element} name=\"{}\"", escape(&record.name));
    for field in Field::all() {
        if matches!(field, Field::Name | Field::Comments) {
            continue;
        }
        if fields::field_is_set(record, *field) {
            let text = fields::field_text(record, *field);
            let _ = write!(out, " {}=\"{}\"", field.key(), escape(&text));
        }
    }
    for (key, value) in &record.extras {
        let _ = write!(out, " {key}=\"{}\"", escape(value));
    }
    match &record.comments {
        Some(comments) => {
            let _ = write!(
                out,
                ">\n      <comments>{}</comments>\n    </{element}>\n",
                escape(comments)
            );
        }
        None => out.push_str("/>\n"),
    }
}

fn apply_entry(record: &mut BundleRecord, key: &str, value: &str) {
    match Field::parse(key) {
        Some(field) => fields::apply_field(record, field, value),
        None => {
            record.extras.insert(canonical_key(key), value.to_string());
        }
    }
}

/// Consumes the children of a row element up to its closing tag,
/// applying each child element's text content as a field. Returns the
/// cursor past the closing tag.
fn read_children(text: &str, mut cursor: usize, row: &str, record: &mut BundleRecord) -> usize {
    while let Some(token) = next_token(text, cursor) {
        match token {
            Token::Close { name, span_end } => {
                cursor = span_end;
                if name == row {
                    return cursor;
                }
            }
            Token::Open {
                name,
                self_closing,
                span_end,
                ..
            } => {
                cursor = span_end;
                if self_closing {
                    apply_entry(record, name, "");
                    continue;
                }
                let close = format!("</{name}");
                if let Some(pos) = text[cursor..].find(&close) {
                    let content = unescape(text[cursor..cursor + pos].trim());
                    apply_entry(record, name, &content);
                    cursor += pos;
                }
            }
        }
    }
    cursor
}

enum Token<'a> {
    Open {
        name: &'a str,
        attributes: &'a str,
        self_closing: bool,
        span_end: usize,
    },
    Close {
        name: &'a str,
        span_end: usize,
    },
}

/// Returns the next tag at or after `from`, skipping declarations,
/// comments, and doctypes. `None` at end of input or on a truncated tag.
fn next_token(text: &str, mut from: usize) -> Option<Token<'_>> {
    loop {
        let start = from + text[from..].find('<')?;
        let rest = &text[start..];
        if rest.starts_with("<?") {
            from = start + rest.find("?>")? + 2;
            continue;
        }
        if rest.starts_with("<!--") {
            from = start + rest.find("-->")? + 3;
            continue;
        }
        if rest.starts_with("<!") {
            from = start + rest.find('>')? + 1;
            continue;
        }

        let end = tag_end(text, start)?;
        let inner = &text[start + 1..end];
        if let Some(name) = inner.strip_prefix('/') {
            return Some(Token::Close {
                name: name.trim(),
                span_end: end + 1,
            });
        }
        let self_closing = inner.ends_with('/');
        let inner = inner.strip_suffix('/').unwrap_or(inner).trim();
        let (name, attributes) = match inner.find(char::is_whitespace) {
            Some(pos) => (&inner[..pos], inner[pos..].trim()),
            None => (inner, ""),
        };
        return Some(Token::Open {
            name,
            attributes,
            self_closing,
            span_end: end + 1,
        });
    }
}

/// Finds the `>` closing the tag opened at `start`, ignoring `>` inside
/// quoted attribute values.
fn tag_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    for (offset, &byte) in bytes[start..].iter().enumerate().skip(1) {
        match quote {
            Some(open) if byte == open => quote = None,
            Some(_) => {}
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'>' => return Some(start + offset),
                _ => {}
            },
        }
    }
    None
}

/// Parses `key="value"` pairs, tolerating single quotes, unquoted
/// values, and bare attributes (skipped).
fn parse_attributes(text: &str) -> Vec<(String, String)> {
    let bytes = text.as_bytes();
    let mut attributes = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if key_start == i {
            break;
        }
        let key = &text[key_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let open = bytes[i];
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != open {
                i += 1;
            }
            attributes.push((key.to_string(), unescape(&text[value_start..i])));
            i += 1;
        } else {
            let value_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            attributes.push((key.to_string(), unescape(&text[value_start..i])));
        }
    }
    attributes
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// Ampersand last, so double-escaped text decodes in one pass.
fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
