//! TSV codec.
//!
//! Tab-separated rows under a header line, preceded by `# key=value`
//! metadata comments. Tabs and newlines inside values are replaced with
//! spaces on write; this is the one deliberately lossy codec.

use super::{Codec, Format, ParsedBundle, split_metadata, write_metadata};
use crate::io::fields::{self, Field, canonical_key};
use crate::io::mode::detect_mode_from_headers;
use crate::models::{BundleRecord, ExportBundle};

/// Tab-separated values codec.
pub struct TsvCodec;

impl Codec for TsvCodec {
    fn format(&self) -> Format {
        Format::Tsv
    }

    fn serialize(&self, bundle: &ExportBundle) -> String {
        let mut out = String::new();
        write_metadata(&mut out, bundle);
        let columns = Field::for_mode(bundle.mode);
        let header = columns
            .iter()
            .map(|f| f.header())
            .collect::<Vec<_>>()
            .join("\t");
        out.push_str(&header);
        out.push('\n');
        for record in &bundle.records {
            let row = columns
                .iter()
                .map(|f| escape_value(&fields::field_text(record, *f)))
                .collect::<Vec<_>>()
                .join("\t");
            out.push_str(&row);
            out.push('\n');
        }
        out
    }

    fn parse(&self, text: &str) -> ParsedBundle {
        let (metadata, rest) = split_metadata(text);
        let mut lines = rest.lines().filter(|line| !line.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return ParsedBundle {
                file_key: metadata.file_key,
                mode: metadata.mode,
                ..ParsedBundle::default()
            };
        };

        let columns: Vec<&str> = header_line.split('\t').collect();
        let column_fields: Vec<Option<Field>> = columns.iter().map(|h| Field::parse(h)).collect();
        let known: Vec<Field> = column_fields.iter().flatten().copied().collect();

        let mut records = Vec::new();
        for line in lines {
            let values: Vec<&str> = line.split('\t').collect();
            let mut record = BundleRecord::default();
            for (index, column) in columns.iter().enumerate() {
                // Short rows leave their trailing fields absent.
                let Some(raw) = values.get(index) else { break };
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
            error: None,
        }
    }
}

/// Flattens tabs and line breaks to single spaces so a value can never
/// split its row or column.
fn escape_value(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Mode};

    fn sample_bundle() -> ExportBundle {
        let mut record = BundleRecord::new("Two Sum");
        record.difficulty = Some(Difficulty::Easy);
        record.intermediate_time = Some(15);
        record.advanced_time = Some(10);
        record.top_time = Some(5);
        record.pattern = Some("Hash Table".to_string());
        ExportBundle::new(Mode::Problems, vec![record]).with_list_id("blind_75")
    }

    #[test]
    fn serializes_metadata_headers_and_rows() {
        let text = TsvCodec.serialize(&sample_bundle());
        assert!(text.starts_with("# version=1\n"));
        assert!(text.contains("# mode=problems\n"));
        assert!(text.contains("# listId=blind_75\n"));
        assert!(text.contains(
            "Problem Name\tDifficulty\tIntermediate Time\tAdvanced Time\tTop Time\tPattern"
        ));
        assert!(text.contains("Two Sum\tEasy\t15\t10\t5\tHash Table"));
    }

    #[test]
    fn tabs_and_newlines_flatten_to_spaces() {
        assert_eq!(escape_value("a\tb"), "a b");
        assert_eq!(escape_value("a\nb"), "a b");
        assert_eq!(escape_value("a\r\nb"), "a b");
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn roundtrips_records_and_mode() {
        let text = TsvCodec.serialize(&sample_bundle());
        let parsed = TsvCodec.parse(&text);
        assert_eq!(parsed.mode, Some(Mode::Problems));
        assert_eq!(parsed.file_key.as_deref(), Some("blind_75"));
        assert_eq!(parsed.records.len(), 1);
        let record = &parsed.records[0];
        assert_eq!(record.name, "Two Sum");
        assert_eq!(record.difficulty, Some(Difficulty::Easy));
        assert_eq!(record.top_time, Some(5));
        assert_eq!(record.pattern.as_deref(), Some("Hash Table"));
    }

    #[test]
    fn single_line_input_yields_nothing() {
        let parsed = TsvCodec.parse("only one line");
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.mode, None);
        assert!(!parsed.is_malformed());
    }

    #[test]
    fn short_rows_leave_trailing_fields_absent() {
        let text = "Problem Name\tDifficulty\tPattern\nTwo Sum\tEasy\n";
        let parsed = TsvCodec.parse(text);
        let record = &parsed.records[0];
        assert_eq!(record.difficulty, Some(Difficulty::Easy));
        assert_eq!(record.pattern, None);
    }

    #[test]
    fn unknown_columns_land_in_extras() {
        let text = "Problem Name\tLeetCode URL\nTwo Sum\thttps://leetcode.com/problems/two-sum\n";
        let parsed = TsvCodec.parse(text);
        assert_eq!(
            parsed.records[0].extras.get("leetcode_url").map(String::as_str),
            Some("https://leetcode.com/problems/two-sum")
        );
    }

    #[test]
    fn header_detection_applies_without_metadata() {
        let text = "Problem Name\tSolved\tTime To Solve\tComments\tSolved Date\nTwo Sum\ttrue\t12\t\t2024-01-15\n";
        let parsed = TsvCodec.parse(text);
        assert_eq!(parsed.mode, Some(Mode::User));
        assert_eq!(parsed.records[0].solved, Some(true));
    }

    #[test]
    fn metadata_mode_wins_over_headers() {
        let text = "# mode=full\nProblem Name\tSolved\tTime To Solve\tComments\tSolved Date\nTwo Sum\ttrue\t12\t\t2024-01-15\n";
        let parsed = TsvCodec.parse(text);
        assert_eq!(parsed.mode, Some(Mode::Full));
    }

    #[test]
    fn rows_without_names_are_dropped() {
        let text = "Problem Name\tDifficulty\n\tEasy\nTwo Sum\tHard\n";
        let parsed = TsvCodec.parse(text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name, "Two Sum");
    }
}
