//! Interchange format codecs.
//!
//! # Architecture
//!
//! Every format implements one [`Codec`] trait: serialize a bundle to
//! text, parse text back to a [`ParsedBundle`]. Parsing is total; a
//! malformed source degrades to an empty or partial bundle carrying an
//! error note, never a panic or `Err`.
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | TSV | `.tsv` | `#` metadata lines; tabs/newlines in values lossy |
//! | CSV | `.csv` | RFC 4180, every output field quoted |
//! | JSON | `.json` | object envelope or bare record array |
//! | XML | `.xml` | `<export>` root, attribute or child-element rows |
//! | YAML | `.yaml` | flat document, block-sequence records |
//!
//! ```rust,ignore
//! use codetrack::io::{Format, codec_for};
//!
//! let codec = codec_for(Format::Csv);
//! let text = codec.serialize(&bundle);
//! let parsed = codec.parse(&text);
//! ```

mod csv;
mod json;
mod tsv;
mod xml;
mod yaml;

use crate::models::{BundleRecord, ExportBundle, Mode};
use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use self::csv::CsvCodec;
pub use self::json::JsonCodec;
pub use self::tsv::TsvCodec;
pub use self::xml::XmlCodec;
pub use self::yaml::YamlCodec;

/// Supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Tab-separated values.
    Tsv,
    /// Comma-separated values (RFC 4180).
    Csv,
    /// JSON envelope.
    Json,
    /// XML document.
    Xml,
    /// YAML document.
    Yaml,
}

impl Format {
    /// Returns all supported formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Tsv, Self::Csv, Self::Json, Self::Xml, Self::Yaml]
    }

    /// Returns the canonical file extension (without the dot).
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Tsv => "tsv",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
        }
    }

    /// Returns the MIME type for HTTP or save-dialog use.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Tsv => "text/tab-separated-values",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Yaml => "application/x-yaml",
        }
    }

    /// Resolves a format from a file extension, `.yml` included.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "tsv" => Some(Self::Tsv),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Resolves a format from a file path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] when the path has no
    /// recognized extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s).ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// The outcome of parsing text in some format.
///
/// Always produced, even for malformed input: `records` holds whatever was
/// recoverable and `error` carries the failure note when the source was
/// malformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBundle {
    /// List key carried by the source, when present.
    pub file_key: Option<String>,
    /// Mode tagged by the source or inferred from its shape.
    pub mode: Option<Mode>,
    /// Recovered records.
    pub records: Vec<BundleRecord>,
    /// Parse-failure note for malformed sources.
    pub error: Option<String>,
}

impl ParsedBundle {
    /// An empty, well-formed bundle.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty bundle flagged malformed.
    #[must_use]
    pub fn malformed(cause: impl Into<String>) -> Self {
        Self {
            error: Some(cause.into()),
            ..Self::default()
        }
    }

    /// True when the source could not be parsed at all.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        self.error.is_some()
    }
}

/// A symmetric serializer/parser for one format.
pub trait Codec: Send + Sync {
    /// The format this codec handles.
    fn format(&self) -> Format;

    /// Serializes a bundle to text.
    fn serialize(&self, bundle: &ExportBundle) -> String;

    /// Parses text to a bundle. Total: malformed input degrades to an
    /// empty or partial bundle, never an error.
    fn parse(&self, text: &str) -> ParsedBundle;
}

/// Returns the codec for a format.
#[must_use]
pub fn codec_for(format: Format) -> &'static dyn Codec {
    match format {
        Format::Tsv => &TsvCodec,
        Format::Csv => &CsvCodec,
        Format::Json => &JsonCodec,
        Format::Xml => &XmlCodec,
        Format::Yaml => &YamlCodec,
    }
}

/// Renders an epoch-millis stamp as RFC 3339 UTC for the structured
/// formats' `exportDate` field.
pub(super) fn export_date_rfc3339(millis: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Metadata recovered from `#` comment lines at the top of tabular files.
#[derive(Debug, Default)]
pub(super) struct TabularMetadata {
    pub file_key: Option<String>,
    pub mode: Option<Mode>,
}

/// Writes the `# key=value` metadata block shared by TSV and CSV.
pub(super) fn write_metadata(out: &mut String, bundle: &ExportBundle) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "# version={}", bundle.version);
    let _ = writeln!(out, "# exportedAt={}", bundle.exported_at);
    let _ = writeln!(out, "# mode={}", bundle.mode);
    if let Some(list_id) = &bundle.list_id {
        let _ = writeln!(out, "# listId={list_id}");
    }
}

/// Splits leading `#` metadata lines from a tabular source.
///
/// Returns the recovered metadata and the remainder starting at the first
/// content line. An unknown mode token fails open to full; unknown keys
/// are ignored.
pub(super) fn split_metadata(text: &str) -> (TabularMetadata, &str) {
    let mut metadata = TabularMetadata::default();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }
        let Some(comment) = trimmed.strip_prefix('#') else {
            break;
        };
        if let Some((key, value)) = comment.split_once('=') {
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "mode" | "exporttype" => {
                    metadata.mode = Some(Mode::parse(value).unwrap_or(Mode::Full));
                }
                "listid" | "filekey" => {
                    if !value.is_empty() {
                        metadata.file_key = Some(value.to_string());
                    }
                }
                // version / exportedAt are informational only.
                _ => {}
            }
        }
        offset += line.len();
    }
    (metadata, &text[offset..])
}
