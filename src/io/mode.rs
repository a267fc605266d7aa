//! Mode projections and inference.
//!
//! A bundle's mode determines which canonical fields its records carry.
//! Projection happens before serialization; inference runs on parse when a
//! source carries no mode tag.

use super::fields::{Field, PROBLEM_COMPARE_FIELDS, USER_COMPARE_FIELDS};
use crate::models::{BundleRecord, Mode};

/// Projects records onto a mode's field set.
///
/// `name` and `extras` pass through regardless of mode. `list_id` is
/// addressing and survives problem-carrying projections only; user rows
/// match by name wherever they land, so pinning them to a source list
/// would block transfers into stores with different list layouts.
#[must_use]
pub fn filter_by_mode(records: &[BundleRecord], mode: Mode) -> Vec<BundleRecord> {
    records.iter().map(|r| project(r, mode)).collect()
}

fn project(record: &BundleRecord, mode: Mode) -> BundleRecord {
    let mut projected = record.clone();
    match mode {
        Mode::Problems => {
            projected.solved = None;
            projected.time_to_solve = None;
            projected.comments = None;
            projected.solved_date = None;
        }
        Mode::User => {
            projected.difficulty = None;
            projected.intermediate_time = None;
            projected.advanced_time = None;
            projected.top_time = None;
            projected.pattern = None;
            projected.list_id = None;
        }
        Mode::Full => {}
    }
    // last_modified is store bookkeeping, not part of any projection.
    projected.last_modified = None;
    projected
}

/// Infers a mode from the fields present on a record.
///
/// Both kinds present -> full; user fields only -> user; otherwise
/// problems. A missing record fails open to full.
#[must_use]
pub fn detect_mode_from_fields(record: Option<&BundleRecord>) -> Mode {
    record.map_or(Mode::Full, |r| {
        match (r.has_problem_fields(), r.has_user_fields()) {
            (true, true) => Mode::Full,
            (false, true) => Mode::User,
            _ => Mode::Problems,
        }
    })
}

/// Infers a mode from a tabular header row.
///
/// User when every user header is present and no problem-specific header
/// appears; problems in the mirror case; otherwise full. Detection order
/// is load-bearing for files missing some expected columns.
#[must_use]
pub fn detect_mode_from_headers(headers: &[Field]) -> Mode {
    let has = |field: Field| headers.contains(&field);
    let any_problem_specific = PROBLEM_COMPARE_FIELDS.iter().any(|f| has(*f));
    let any_user_specific = USER_COMPARE_FIELDS.iter().any(|f| has(*f));

    let all_user = Field::for_mode(Mode::User).iter().all(|f| has(*f));
    if all_user && !any_problem_specific {
        return Mode::User;
    }
    let all_problem = Field::for_mode(Mode::Problems).iter().all(|f| has(*f));
    if all_problem && !any_user_specific {
        return Mode::Problems;
    }
    Mode::Full
}
