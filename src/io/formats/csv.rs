//! CSV codec (RFC 4180).
//!
//! Every output field is quoted, so embedded commas, quotes (doubled),
//! and newlines all survive a round trip. The reader tolerates foreign
//! files with unquoted fields and ragged rows.

use super::{Codec, Format, ParsedBundle, split_metadata, write_metadata};
use crate::io::fields::{self, Field, canonical_key};
use crate::io::mode::detect_mode_from_headers;
use crate::models::{BundleRecord, ExportBundle};
use csv::{QuoteStyle, ReaderBuilder, Trim, WriterBuilder};

/// Comma-separated values codec.
pub struct CsvCodec;

impl Codec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn serialize(&self, bundle: &ExportBundle) -> String {
        let mut out = String::new();
        write_metadata(&mut out, bundle);

        let columns = Field::for_mode(bundle.mode);
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());

        // Writes to a Vec cannot fail; discarded results keep the codec
        // interface infallible.
        let _ = writer.write_record(columns.iter().map(|f| f.header()));
        for record in &bundle.records {
            let _ = writer.write_record(columns.iter().map(|f| fields::field_text(record, *f)));
        }

        let bytes = writer.into_inner().unwrap_or_default();
        out.push_str(&String::from_utf8(bytes).unwrap_or_default());
        out
    }

    fn parse(&self, text: &str) -> ParsedBundle {
        let (metadata, rest) = split_metadata(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(rest.as_bytes());

        let columns: Vec<String> = match reader.headers() {
            Ok(headers) => headers.iter().map(str::to_string).collect(),
            Err(e) => {
                return ParsedBundle {
                    file_key: metadata.file_key,
                    mode: metadata.mode,
                    records: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };
        let column_fields: Vec<Option<Field>> = columns.iter().map(|h| Field::parse(h)).collect();
        let known: Vec<Field> = column_fields.iter().flatten().copied().collect();

        let mut records = Vec::new();
        let mut error = None;
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    // Keep whatever else parses; surface the first failure.
                    if error.is_none() {
                        error = Some(e.to_string());
                    }
                    continue;
                }
            };
            let mut record = BundleRecord::default();
            for (index, column) in columns.iter().enumerate() {
                let Some(raw) = row.get(index) else { break };
                match column_fields[index] {
                    Some(field) => fields::apply_field(&mut record, field, raw),
                    None => {
                        record
                            .extras
                            .insert(canonical_key(column), raw.trim().to_string());
                    }
                }
            }
            if record.name.is_empty() {
                continue;
            }
            records.push(record);
        }

        let mode = metadata
            .mode
            .or_else(|| (!known.is_empty()).then(|| detect_mode_from_headers(&known)));
        ParsedBundle {
            file_key: metadata.file_key,
            mode,
            records,
            error,
        }
    }
}
