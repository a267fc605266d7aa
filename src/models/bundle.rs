//! Export bundle and wire-record types.
//!
//! A bundle is the serialized unit every codec reads and writes: metadata
//! (version, timestamp, mode, optional list) plus a sequence of records
//! projected by mode.

use super::problem::{Difficulty, ProblemRecord, ProgressRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bundle schema version emitted by every serializer.
pub const BUNDLE_VERSION: u32 = 1;

/// Which field projection a bundle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Problem definitions only.
    Problems,
    /// Per-user progress only.
    User,
    /// Both projections.
    #[default]
    Full,
}

impl Mode {
    /// Returns all mode variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Problems, Self::User, Self::Full]
    }

    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Problems => "problems",
            Self::User => "user",
            Self::Full => "full",
        }
    }

    /// Parses a mode from a string.
    ///
    /// Accepts the legacy spellings used by earlier exporters
    /// (`PROGRESS_ONLY`, `FULL_DATA`). Callers that must never reject fall
    /// back to [`Mode::Full`] on `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "problems" | "problem" => Some(Self::Problems),
            "user" | "progress" | "progress_only" | "progress-only" => Some(Self::User),
            "full" | "full_data" | "full-data" | "all" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How conflicting records are resolved on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Imported values win for every conflicting record.
    ReplaceAll,
    /// Existing values are retained; only genuinely new records are written.
    SkipAll,
    /// Per record, the side with the newer `last_modified` wins; ties favor
    /// existing.
    MergeAll,
    /// Conflicting records are deferred to the caller for a per-batch
    /// decision.
    #[default]
    AskEach,
}

impl ConflictStrategy {
    /// Returns all strategy variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ReplaceAll, Self::SkipAll, Self::MergeAll, Self::AskEach]
    }

    /// Returns the strategy as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceAll => "replace_all",
            Self::SkipAll => "skip_all",
            Self::MergeAll => "merge_all",
            Self::AskEach => "ask_each",
        }
    }

    /// Parses a strategy from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "replace_all" | "replace" => Some(Self::ReplaceAll),
            "skip_all" | "skip" => Some(Self::SkipAll),
            "merge_all" | "merge" => Some(Self::MergeAll),
            "ask_each" | "ask" => Some(Self::AskEach),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single row moving through import or export.
///
/// The union of the problem and progress shapes with every field optional
/// except `name`. `None` means the field was absent from the source, which
/// matters for mode inference and conflict detection; parsed blank string
/// fields are `Some("")`, not `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BundleRecord {
    /// Problem name; the identity key.
    pub name: String,
    /// Difficulty, when carried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Intermediate tier target minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate_time: Option<u32>,
    /// Advanced tier target minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_time: Option<u32>,
    /// Top tier target minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_time: Option<u32>,
    /// Solution pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Owning list, carried per row in all-lists structured exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    /// Solved flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solved: Option<bool>,
    /// Minutes taken on the recorded solve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_solve: Option<u32>,
    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Date of the recorded solve, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solved_date: Option<String>,
    /// Epoch-millis of the source row's last write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    /// Unrecognized columns/keys, preserved as best-effort data.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

impl BundleRecord {
    /// Creates a record carrying only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True when any problem-specific field is present.
    #[must_use]
    pub const fn has_problem_fields(&self) -> bool {
        self.difficulty.is_some()
            || self.intermediate_time.is_some()
            || self.advanced_time.is_some()
            || self.top_time.is_some()
            || self.pattern.is_some()
    }

    /// True when any user-specific field is present.
    #[must_use]
    pub const fn has_user_fields(&self) -> bool {
        self.solved.is_some()
            || self.time_to_solve.is_some()
            || self.comments.is_some()
            || self.solved_date.is_some()
    }

    /// Overlays progress fields onto the record.
    #[must_use]
    pub fn with_progress(mut self, progress: &ProgressRecord) -> Self {
        self.solved = Some(progress.solved);
        self.time_to_solve = progress.time_to_solve;
        self.comments = Some(progress.comments.clone().unwrap_or_default());
        self.solved_date = Some(progress.solved_date.clone().unwrap_or_default());
        self.last_modified = Some(progress.last_modified);
        self
    }
}

impl From<&ProblemRecord> for BundleRecord {
    fn from(problem: &ProblemRecord) -> Self {
        Self {
            name: problem.name.clone(),
            difficulty: Some(problem.difficulty),
            intermediate_time: problem.intermediate_time,
            advanced_time: problem.advanced_time,
            top_time: problem.top_time,
            pattern: Some(problem.pattern.clone().unwrap_or_default()),
            list_id: Some(problem.list_id.clone()),
            ..Self::default()
        }
    }
}

/// The serialized unit every codec reads and writes.
#[derive(Debug, Clone, Serialize)]
pub struct ExportBundle {
    /// Bundle schema version.
    pub version: u32,
    /// Epoch-millis the bundle was produced.
    #[serde(rename = "exportedAt")]
    pub exported_at: i64,
    /// Field projection the records carry.
    pub mode: Mode,
    /// Addressed list; absent means all lists.
    #[serde(rename = "fileKey", skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    /// The projected rows.
    #[serde(rename = "problems")]
    pub records: Vec<BundleRecord>,
}

impl ExportBundle {
    /// Creates a bundle stamped with the current time.
    #[must_use]
    pub fn new(mode: Mode, records: Vec<BundleRecord>) -> Self {
        Self {
            version: BUNDLE_VERSION,
            exported_at: crate::current_timestamp_ms(),
            mode,
            list_id: None,
            records,
        }
    }

    /// Sets the addressed list.
    #[must_use]
    pub fn with_list_id(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }
}
