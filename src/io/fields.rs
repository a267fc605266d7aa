//! Canonical field model.
//!
//! Single source of truth for the fields a record can carry: display
//! headers, header/key recognition (including legacy aliases), per-mode
//! header orders, value coercion on parse, and textual readback for the
//! tabular serializers.

use crate::models::{BundleRecord, Difficulty, Mode};

/// A canonical record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Problem name; identity key.
    Name,
    /// Difficulty rating.
    Difficulty,
    /// Intermediate tier target minutes.
    IntermediateTime,
    /// Advanced tier target minutes.
    AdvancedTime,
    /// Top tier target minutes.
    TopTime,
    /// Solution pattern.
    Pattern,
    /// Owning list id.
    ListId,
    /// Solved flag.
    Solved,
    /// Minutes taken on the recorded solve.
    TimeToSolve,
    /// Free-text notes.
    Comments,
    /// Date of the recorded solve.
    SolvedDate,
    /// Epoch-millis of the row's last write.
    LastModified,
}

/// Header order for problems-mode tabular output.
const PROBLEM_FIELDS: &[Field] = &[
    Field::Name,
    Field::Difficulty,
    Field::IntermediateTime,
    Field::AdvancedTime,
    Field::TopTime,
    Field::Pattern,
];

/// Header order for user-mode tabular output.
const USER_FIELDS: &[Field] = &[
    Field::Name,
    Field::Solved,
    Field::TimeToSolve,
    Field::Comments,
    Field::SolvedDate,
];

/// Header order for full-mode tabular output: problem fields then the
/// user fields minus the shared name column.
const FULL_FIELDS: &[Field] = &[
    Field::Name,
    Field::Difficulty,
    Field::IntermediateTime,
    Field::AdvancedTime,
    Field::TopTime,
    Field::Pattern,
    Field::Solved,
    Field::TimeToSolve,
    Field::Comments,
    Field::SolvedDate,
];

/// Problem-side fields compared by the conflict detector.
pub const PROBLEM_COMPARE_FIELDS: &[Field] = &[
    Field::Difficulty,
    Field::IntermediateTime,
    Field::AdvancedTime,
    Field::TopTime,
    Field::Pattern,
];

/// User-side fields compared by the conflict detector.
pub const USER_COMPARE_FIELDS: &[Field] = &[
    Field::Solved,
    Field::TimeToSolve,
    Field::Comments,
    Field::SolvedDate,
];

impl Field {
    /// Returns every canonical field.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Name,
            Self::Difficulty,
            Self::IntermediateTime,
            Self::AdvancedTime,
            Self::TopTime,
            Self::Pattern,
            Self::ListId,
            Self::Solved,
            Self::TimeToSolve,
            Self::Comments,
            Self::SolvedDate,
            Self::LastModified,
        ]
    }

    /// Returns the display header for the field.
    #[must_use]
    pub const fn header(&self) -> &'static str {
        match self {
            Self::Name => "Problem Name",
            Self::Difficulty => "Difficulty",
            Self::IntermediateTime => "Intermediate Time",
            Self::AdvancedTime => "Advanced Time",
            Self::TopTime => "Top Time",
            Self::Pattern => "Pattern",
            Self::ListId => "List ID",
            Self::Solved => "Solved",
            Self::TimeToSolve => "Time To Solve",
            Self::Comments => "Comments",
            Self::SolvedDate => "Solved Date",
            Self::LastModified => "Last Modified",
        }
    }

    /// Returns the canonical snake_case key for the field.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Difficulty => "difficulty",
            Self::IntermediateTime => "intermediate_time",
            Self::AdvancedTime => "advanced_time",
            Self::TopTime => "top_time",
            Self::Pattern => "pattern",
            Self::ListId => "list_id",
            Self::Solved => "solved",
            Self::TimeToSolve => "time_to_solve",
            Self::Comments => "comments",
            Self::SolvedDate => "solved_date",
            Self::LastModified => "last_modified",
        }
    }

    /// Resolves a header or key to a field.
    ///
    /// Case-insensitive and indifferent to spaces, underscores, and
    /// hyphens, so display headers, snake_case keys, and camelCase
    /// attribute names all resolve. Legacy header spellings from earlier
    /// exporters are accepted.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let normalized: String = header
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        match normalized.as_str() {
            "name" | "problemname" => Some(Self::Name),
            "difficulty" => Some(Self::Difficulty),
            "intermediatetime" | "intermediatemaxtime" => Some(Self::IntermediateTime),
            "advancedtime" | "advancedmaxtime" => Some(Self::AdvancedTime),
            "toptime" | "topofthecropmaxtime" => Some(Self::TopTime),
            "pattern" | "problempattern" => Some(Self::Pattern),
            "listid" => Some(Self::ListId),
            "solved" => Some(Self::Solved),
            "timetosolve" => Some(Self::TimeToSolve),
            "comments" => Some(Self::Comments),
            "solveddate" => Some(Self::SolvedDate),
            "lastmodified" => Some(Self::LastModified),
            _ => None,
        }
    }

    /// Returns the ordered header fields serialized for a mode.
    #[must_use]
    pub const fn for_mode(mode: Mode) -> &'static [Self] {
        match mode {
            Mode::Problems => PROBLEM_FIELDS,
            Mode::User => USER_FIELDS,
            Mode::Full => FULL_FIELDS,
        }
    }
}

/// Resolves a header to its canonical key, snake_casing unknown headers
/// so their values survive as best-effort extras.
#[must_use]
pub fn canonical_key(header: &str) -> String {
    Field::parse(header).map_or_else(
        || {
            header
                .trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
        },
        |field| field.key().to_string(),
    )
}

/// Coerces a raw textual value onto a record field.
///
/// - `solved`: `"true"`/`"1"` (case-insensitive) -> true, anything else
///   false
/// - minute fields: non-negative integer, or absent when blank or
///   unparseable
/// - `difficulty`: parsed rating, defaulting to Medium
/// - `last_modified`: integer epoch-millis, with RFC 3339 text accepted
/// - everything else: trimmed and passed through; blank stays present as
///   an empty string
pub fn apply_field(record: &mut BundleRecord, field: Field, raw: &str) {
    let trimmed = raw.trim();
    match field {
        Field::Name => record.name = trimmed.to_string(),
        Field::Difficulty => {
            record.difficulty = Some(Difficulty::parse(trimmed).unwrap_or_default());
        }
        Field::IntermediateTime => record.intermediate_time = parse_minutes(trimmed),
        Field::AdvancedTime => record.advanced_time = parse_minutes(trimmed),
        Field::TopTime => record.top_time = parse_minutes(trimmed),
        Field::Pattern => record.pattern = Some(trimmed.to_string()),
        Field::ListId => {
            record.list_id = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        Field::Solved => record.solved = Some(parse_solved(trimmed)),
        Field::TimeToSolve => record.time_to_solve = parse_minutes(trimmed),
        Field::Comments => record.comments = Some(trimmed.to_string()),
        Field::SolvedDate => record.solved_date = Some(trimmed.to_string()),
        Field::LastModified => record.last_modified = parse_timestamp(trimmed),
    }
}

/// Reads a field back as the text a tabular serializer writes.
///
/// Absent fields render as empty strings, keeping row width fixed.
#[must_use]
pub fn field_text(record: &BundleRecord, field: Field) -> String {
    match field {
        Field::Name => record.name.clone(),
        Field::Difficulty => record
            .difficulty
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
        Field::IntermediateTime => minutes_text(record.intermediate_time),
        Field::AdvancedTime => minutes_text(record.advanced_time),
        Field::TopTime => minutes_text(record.top_time),
        Field::Pattern => record.pattern.clone().unwrap_or_default(),
        Field::ListId => record.list_id.clone().unwrap_or_default(),
        Field::Solved => record
            .solved
            .map(|s| s.to_string())
            .unwrap_or_default(),
        Field::TimeToSolve => minutes_text(record.time_to_solve),
        Field::Comments => record.comments.clone().unwrap_or_default(),
        Field::SolvedDate => record.solved_date.clone().unwrap_or_default(),
        Field::LastModified => record
            .last_modified
            .map(|ts| ts.to_string())
            .unwrap_or_default(),
    }
}

fn minutes_text(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Whether a record carries a value for the field.
///
/// Distinguishes a present-but-empty value from a structurally absent
/// one, which `field_text` cannot.
#[must_use]
pub fn field_is_set(record: &BundleRecord, field: Field) -> bool {
    match field {
        Field::Name => !record.name.is_empty(),
        Field::Difficulty => record.difficulty.is_some(),
        Field::IntermediateTime => record.intermediate_time.is_some(),
        Field::AdvancedTime => record.advanced_time.is_some(),
        Field::TopTime => record.top_time.is_some(),
        Field::Pattern => record.pattern.is_some(),
        Field::ListId => record.list_id.is_some(),
        Field::Solved => record.solved.is_some(),
        Field::TimeToSolve => record.time_to_solve.is_some(),
        Field::Comments => record.comments.is_some(),
        Field::SolvedDate => record.solved_date.is_some(),
        Field::LastModified => record.last_modified.is_some(),
    }
}

/// Parses a solved flag: `"true"`/`"1"` in any case, anything else false.
#[must_use]
pub fn parse_solved(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1")
}

/// Parses a minutes value: non-negative integer or absent.
#[must_use]
pub fn parse_minutes(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Parses a `last_modified` stamp: integer epoch-millis, falling back to
/// RFC 3339 text.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Some(millis);
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
