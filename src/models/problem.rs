//! Problem, progress, and list types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty rating for a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Difficulty {
    /// Introductory problem.
    Easy,
    /// Standard interview problem.
    #[default]
    Medium,
    /// Advanced problem.
    Hard,
}

impl Difficulty {
    /// Returns all difficulty variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Easy, Self::Medium, Self::Hard]
    }

    /// Returns the difficulty as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Parses a difficulty from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique identifier for a problem within the store.
///
/// Derived from the owning list and the problem name, so the same name in
/// two lists yields two distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(String);

impl ProblemId {
    /// Creates a problem ID from a raw string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the canonical ID for a problem name within a list.
    ///
    /// The name is lowercased with whitespace runs collapsed to single
    /// underscores: `("blind_75", "Two Sum")` -> `"blind_75_two_sum"`.
    #[must_use]
    pub fn from_parts(list_id: &str, name: &str) -> Self {
        let slug = name
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        Self(format!("{list_id}_{slug}"))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProblemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProblemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A problem definition stored in a list.
///
/// `name` is the identity key within a list; the same name may appear in
/// several lists and shares progress across them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRecord {
    /// Derived store identifier.
    pub id: ProblemId,
    /// The list this problem belongs to.
    pub list_id: String,
    /// Problem name (non-empty).
    pub name: String,
    /// Difficulty rating.
    pub difficulty: Difficulty,
    /// Target minutes for the intermediate tier.
    pub intermediate_time: Option<u32>,
    /// Target minutes for the advanced tier.
    pub advanced_time: Option<u32>,
    /// Target minutes for the top tier.
    pub top_time: Option<u32>,
    /// Solution pattern (e.g. "Hash Table", "Two Pointers").
    pub pattern: Option<String>,
}

impl ProblemRecord {
    /// Creates a problem in a list with default difficulty and no targets.
    #[must_use]
    pub fn new(list_id: impl Into<String>, name: impl Into<String>) -> Self {
        let list_id = list_id.into();
        let name = name.into();
        Self {
            id: ProblemId::from_parts(&list_id, &name),
            list_id,
            name,
            difficulty: Difficulty::default(),
            intermediate_time: None,
            advanced_time: None,
            top_time: None,
            pattern: None,
        }
    }

    /// Sets the difficulty.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the three tier time targets, in minutes.
    #[must_use]
    pub const fn with_tier_times(mut self, intermediate: u32, advanced: u32, top: u32) -> Self {
        self.intermediate_time = Some(intermediate);
        self.advanced_time = Some(advanced);
        self.top_time = Some(top);
        self
    }

    /// Sets the solution pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Per-user progress for a single problem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressRecord {
    /// Whether the problem has been solved.
    pub solved: bool,
    /// Minutes taken on the recorded solve.
    pub time_to_solve: Option<u32>,
    /// Free-text notes.
    pub comments: Option<String>,
    /// Date of the recorded solve, passed through verbatim (ISO-8601
    /// recommended).
    pub solved_date: Option<String>,
    /// Epoch-millis of the last write; updated on every upsert.
    pub last_modified: i64,
}

impl ProgressRecord {
    /// Creates empty progress (unsolved, never written).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the progress solved with a time and date.
    #[must_use]
    pub fn solved(time_to_solve: u32, solved_date: impl Into<String>) -> Self {
        Self {
            solved: true,
            time_to_solve: Some(time_to_solve),
            comments: None,
            solved_date: Some(solved_date.into()),
            last_modified: 0,
        }
    }
}

/// Metadata for a problem list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMeta {
    /// List identifier (e.g. `"blind_75"`).
    pub id: String,
    /// Human-readable name (e.g. `"Blind 75"`).
    pub display_name: String,
    /// Position in the list ordering.
    pub sort_order: u32,
}

impl ListMeta {
    /// Creates list metadata with a display name titled from the id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let display_name = display_name_from_id(&id);
        Self {
            id,
            display_name,
            sort_order: 0,
        }
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn with_sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Titles a list id for display: `"blind_75"` -> `"Blind 75"`.
#[must_use]
pub fn display_name_from_id(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
