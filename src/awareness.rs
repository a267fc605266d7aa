//! Awareness scoring for spaced-repetition review.
//!
//! A solved problem's awareness score grows with the days since its
//! solve; the score's color band tells the user how overdue a review is.
//!
//! # Algorithm
//!
//! For a solved problem `p` with `days` elapsed since its solve date:
//!
//! ```text
//! score(p) = days * base_rate * commitment * multiplier(tier, difficulty)
//!            / solved_factor(tier, unique_solved)
//! ```
//!
//! Where:
//! - `tier` grades the recorded solve time against the problem's three
//!   tier targets (top, advanced, intermediate), `below` when it beats
//!   none of them
//! - `multiplier` is a fixed tier-by-difficulty matrix; top-tier Easy is
//!   0, so a mastered easy problem never decays
//! - `commitment` = problems-per-day / 2 (two per day is the baseline)
//! - `solved_factor` = `1 + (scaling + tier_bonus) * log2(1 + unique_solved)`,
//!   so a growing solved count slows decay, most of all for top-tier solves
//!
//! Unsolved problems and problems without a solve date have no score; an
//! unparseable solve date is flagged so the caller can surface it.

#![allow(clippy::cast_precision_loss)]

use std::collections::HashSet;
use std::fmt;

use crate::Result;
use crate::models::{Difficulty, ProblemRecord, ProgressRecord};
use crate::storage::ProgressStore;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Problems-per-day rate treated as a neutral commitment.
const COMMITMENT_BASELINE: f64 = 2.0;

/// Performance tier of a recorded solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Within the top target.
    Top,
    /// Within the advanced target.
    Advanced,
    /// Within the intermediate target.
    Intermediate,
    /// Beat no target, or no usable solve time.
    Below,
}

impl Tier {
    /// Grades a solve time against the problem's tier targets.
    ///
    /// A missing or zero target passes its tier, matching the original
    /// tracker data where unset targets mean "no bar to clear". Missing,
    /// zero, or negative solve times grade `Below`.
    #[must_use]
    pub fn for_solve(problem: &ProblemRecord, time_to_solve: Option<u32>) -> Self {
        let Some(minutes) = time_to_solve.filter(|&m| m > 0) else {
            return Self::Below;
        };
        let within =
            |target: Option<u32>| target.filter(|&t| t > 0).is_none_or(|t| minutes <= t);
        if within(problem.top_time) {
            Self::Top
        } else if within(problem.advanced_time) {
            Self::Advanced
        } else if within(problem.intermediate_time) {
            Self::Intermediate
        } else {
            Self::Below
        }
    }

    /// Combined tier-by-difficulty decay multiplier.
    ///
    /// Top tier inverts the usual order: deep mastery of a medium problem
    /// decays slower than of a hard one, and a mastered easy problem not
    /// at all. Every other tier decays easy fastest.
    #[must_use]
    pub const fn multiplier(self, difficulty: Difficulty) -> f64 {
        match (self, difficulty) {
            (Self::Top, Difficulty::Easy) => 0.0,
            (Self::Top, Difficulty::Medium) => 0.25,
            (Self::Top, Difficulty::Hard) => 0.4,
            (Self::Advanced, Difficulty::Easy) => 1.2,
            (Self::Advanced, Difficulty::Medium) => 0.9,
            (Self::Advanced, Difficulty::Hard) => 0.7,
            (Self::Intermediate, Difficulty::Easy) => 1.5,
            (Self::Intermediate, Difficulty::Medium) => 1.0,
            (Self::Intermediate, Difficulty::Hard) => 0.75,
            (Self::Below, Difficulty::Easy) => 1.8,
            (Self::Below, Difficulty::Medium) => 1.3,
            (Self::Below, Difficulty::Hard) => 1.0,
        }
    }

    /// Extra solved-factor scaling per tier.
    const fn solved_bonus(self) -> f64 {
        match self {
            Self::Top => 0.3,
            Self::Advanced => 0.2,
            Self::Intermediate => 0.1,
            Self::Below => 0.0,
        }
    }
}

/// The five ascending score thresholds bounding the color bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    /// Upper bound of the white band.
    pub white: u32,
    /// Upper bound of the green band.
    pub green: u32,
    /// Upper bound of the yellow band.
    pub yellow: u32,
    /// Upper bound of the red band.
    pub red: u32,
    /// Upper bound of the dark-red band; at or above is flashing.
    pub dark_red: u32,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            white: 10,
            green: 30,
            yellow: 50,
            red: 70,
            dark_red: 90,
        }
    }
}

impl ThresholdSet {
    /// Largest allowed threshold value.
    pub const MAX: u32 = 200;

    /// Returns a strictly increasing copy with every value in `1..=MAX`.
    ///
    /// Each band's cap leaves one unit of headroom per later band, so the
    /// strictness pass can always bump a value without crossing `MAX`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut values = [self.white, self.green, self.yellow, self.red, self.dark_red];
        let mut cap = Self::MAX - 4;
        for value in &mut values {
            *value = (*value).clamp(1, cap);
            cap += 1;
        }
        for i in 1..values.len() {
            if values[i] <= values[i - 1] {
                values[i] = values[i - 1] + 1;
            }
        }
        Self {
            white: values[0],
            green: values[1],
            yellow: values[2],
            red: values[3],
            dark_red: values[4],
        }
    }

    /// Maps a score to its color band; no score means unsolved.
    #[must_use]
    pub fn band_for(&self, score: Option<f64>) -> Band {
        let Some(score) = score else {
            return Band::Unsolved;
        };
        if score < f64::from(self.white) {
            Band::White
        } else if score < f64::from(self.green) {
            Band::Green
        } else if score < f64::from(self.yellow) {
            Band::Yellow
        } else if score < f64::from(self.red) {
            Band::Red
        } else if score < f64::from(self.dark_red) {
            Band::DarkRed
        } else {
            Band::Flashing
        }
    }
}

/// Color band a score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// No score; the problem is unsolved or undated.
    Unsolved,
    /// Fresh; no review needed.
    White,
    /// Comfortable.
    Green,
    /// Review soon.
    Yellow,
    /// Overdue.
    Red,
    /// Long overdue.
    DarkRed,
    /// At or past the last threshold.
    Flashing,
}

impl Band {
    /// Returns the band as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsolved => "unsolved",
            Self::White => "white",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::DarkRed => "dark-red",
            Self::Flashing => "flashing",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tunable scoring inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AwarenessConfig {
    /// The user's target problems per day.
    pub problems_per_day: f64,
    /// Score points per elapsed day before scaling.
    pub base_rate: f64,
    /// Solved-factor scaling applied to every tier.
    pub base_solved_scaling: f64,
    /// Band thresholds.
    pub thresholds: ThresholdSet,
}

impl Default for AwarenessConfig {
    fn default() -> Self {
        Self {
            problems_per_day: 2.0,
            base_rate: 2.0,
            base_solved_scaling: 0.1,
            thresholds: ThresholdSet::default(),
        }
    }
}

impl AwarenessConfig {
    /// Decay speed relative to the baseline commitment.
    #[must_use]
    pub fn commitment_factor(&self) -> f64 {
        self.problems_per_day / COMMITMENT_BASELINE
    }
}

/// Elapsed time since a solve, with a validity flag for bad dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaysSince {
    /// Fractional days elapsed; negative means no usable date.
    pub days: f64,
    /// False when the stored date failed to parse.
    pub valid: bool,
}

/// A problem's computed awareness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwarenessScore {
    /// The score; `None` for unsolved or undated problems.
    pub score: Option<f64>,
    /// True when the solve date was present but unparseable.
    pub invalid_date: bool,
}

/// Computes fractional days between a solve date and `now_ms`.
///
/// No date is valid (the problem simply has no score); an unparseable
/// date is invalid; a future date clamps to zero elapsed days.
#[must_use]
pub fn days_since_completion(solved_date: Option<&str>, now_ms: i64) -> DaysSince {
    let Some(raw) = solved_date.map(str::trim).filter(|s| !s.is_empty()) else {
        return DaysSince {
            days: -1.0,
            valid: true,
        };
    };
    let Some(solved_ms) = parse_date_millis(raw) else {
        return DaysSince {
            days: -1.0,
            valid: false,
        };
    };
    if solved_ms > now_ms {
        return DaysSince {
            days: 0.0,
            valid: true,
        };
    }
    DaysSince {
        days: (now_ms - solved_ms) as f64 / MILLIS_PER_DAY,
        valid: true,
    }
}

/// Parses the date spellings stored progress has accumulated over time.
fn parse_date_millis(raw: &str) -> Option<i64> {
    if let Ok(stamped) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.timestamp_millis());
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"] {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc().timestamp_millis());
        }
    }
    None
}

/// Decay divisor from the user's overall solved count.
#[must_use]
pub fn solved_factor(tier: Tier, unique_solved: usize, config: &AwarenessConfig) -> f64 {
    let count = unique_solved as f64;
    1.0 + (config.base_solved_scaling + tier.solved_bonus()) * (count + 1.0).log2()
}

/// Scores one problem's awareness at `now_ms`.
///
/// `unique_solved` is the user's distinct solved-name count across every
/// list, from [`total_unique_solved`]. The returned score is never
/// negative.
#[must_use]
pub fn awareness_score(
    problem: &ProblemRecord,
    progress: &ProgressRecord,
    unique_solved: usize,
    config: &AwarenessConfig,
    now_ms: i64,
) -> AwarenessScore {
    if !progress.solved {
        return AwarenessScore {
            score: None,
            invalid_date: false,
        };
    }
    let elapsed = days_since_completion(progress.solved_date.as_deref(), now_ms);
    if !elapsed.valid {
        return AwarenessScore {
            score: None,
            invalid_date: true,
        };
    }
    if elapsed.days < 0.0 {
        return AwarenessScore {
            score: None,
            invalid_date: false,
        };
    }

    let tier = Tier::for_solve(problem, progress.time_to_solve);
    let score = elapsed.days * config.base_rate * config.commitment_factor()
        * tier.multiplier(problem.difficulty)
        / solved_factor(tier, unique_solved, config);

    AwarenessScore {
        score: Some(score),
        invalid_date: false,
    }
}

/// Counts distinct solved problem names across every list.
///
/// Duplicate names share propagated progress, so each name counts once
/// no matter how many lists carry it.
///
/// # Errors
///
/// Returns a store error.
pub fn total_unique_solved(store: &dyn ProgressStore) -> Result<usize> {
    let mut names = HashSet::new();
    for problem in store.get_all_problems()? {
        if names.contains(&problem.name) {
            continue;
        }
        if store
            .get_progress(&problem.id)?
            .is_some_and(|progress| progress.solved)
        {
            names.insert(problem.name);
        }
    }
    Ok(names.len())
}
