//! Content-based format detection.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use crate::io::formats::Format;
use once_cell::sync::Lazy;
use regex::Regex;

/// A plain `key: value` line, the YAML tell once JSON and XML are ruled
/// out.
static YAML_KEY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*:(\s|$)").expect("static regex: yaml key line")
});

/// Resolves the interchange format of incoming content.
///
/// A recognized filename extension wins. Otherwise the content is
/// sniffed in order: JSON by a leading brace or bracket, XML by a
/// leading angle bracket, TSV by a tab in the first content line, YAML
/// by document markers or `key: value` shape. Anything left is treated
/// as CSV, so detection never fails.
#[must_use]
pub fn detect_format(filename: Option<&str>, content: &str) -> Format {
    if let Some(format) = filename
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| Format::from_extension(ext))
    {
        return format;
    }

    let trimmed = content.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Format::Json;
    }
    if trimmed.starts_with('<') {
        return Format::Xml;
    }
    match first_content_line(content) {
        Some(line) if line.contains('\t') => Format::Tsv,
        Some(line) if looks_like_yaml(line) => Format::Yaml,
        _ => Format::Csv,
    }
}

/// First line that is neither blank nor a `#` metadata comment.
fn first_content_line(content: &str) -> Option<&str> {
    content
        .lines()
        .map(str::trim_end)
        .find(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
}

fn looks_like_yaml(line: &str) -> bool {
    line == "---" || line.starts_with("- ") || YAML_KEY_LINE.is_match(line)
}
