//! Property-based tests for the import/export engine.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Codec roundtrips preserve records in every format
//! - Format detection and parsing are total over arbitrary text
//! - Mode and strategy tokens roundtrip through their parsers
//! - Mode projection and mode inference agree
//! - Threshold normalization is strictly increasing and idempotent

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use codetrack::awareness::{Band, ThresholdSet};
use codetrack::io::{detect_mode_from_fields, filter_by_mode};
use codetrack::models::BundleRecord;
use codetrack::{ConflictStrategy, Difficulty, ExportBundle, Format, Mode, codec_for,
    detect_format};

/// Text that survives every codec: no tabs or line breaks, which the TSV
/// writer deliberately flattens.
fn safe_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.!?'()-]{0,38}[A-Za-z0-9]"
}

/// A record shaped like an export row: every canonical column present,
/// the way the full-mode progress overlay emits them.
fn export_row() -> impl Strategy<Value = BundleRecord> {
    (
        safe_text(),
        prop::sample::select(vec![
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
        ]),
        proptest::option::of(1u32..600),
        proptest::option::of(1u32..600),
        proptest::option::of(1u32..600),
        proptest::option::of(safe_text()),
        any::<bool>(),
        proptest::option::of(1u32..600),
        proptest::option::of(safe_text()),
        proptest::option::of("20[0-9]{2}-[01][0-9]-[0-3][0-9]"),
    )
        .prop_map(
            |(
                name,
                difficulty,
                intermediate,
                advanced,
                top,
                pattern,
                solved,
                time_to_solve,
                comments,
                solved_date,
            )| {
                let mut record = BundleRecord::new(name);
                record.difficulty = Some(difficulty);
                record.intermediate_time = intermediate;
                record.advanced_time = advanced;
                record.top_time = top;
                record.pattern = pattern;
                record.solved = Some(solved);
                record.time_to_solve = time_to_solve;
                record.comments = comments;
                record.solved_date = solved_date;
                record
            },
        )
}

/// Blank and absent text are the same user content.
fn text_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or_default() == b.unwrap_or_default()
}

proptest! {
    /// Property: every codec preserves record count, order, and field
    /// values for rows shaped like its own output.
    #[test]
    fn prop_codec_roundtrip_preserves_records(records in prop::collection::vec(export_row(), 1..5)) {
        for format in Format::all() {
            let bundle = ExportBundle::new(Mode::Full, records.clone());
            let serialized = codec_for(*format).serialize(&bundle);
            let parsed = codec_for(*format).parse(&serialized);

            prop_assert!(parsed.error.is_none(), "{format}: {:?}", parsed.error);
            prop_assert_eq!(parsed.mode, Some(Mode::Full), "{}", format);
            prop_assert_eq!(parsed.records.len(), records.len(), "{}", format);
            for (original, roundtripped) in records.iter().zip(&parsed.records) {
                prop_assert_eq!(&original.name, &roundtripped.name, "{}", format);
                prop_assert_eq!(original.difficulty, roundtripped.difficulty, "{}", format);
                prop_assert_eq!(
                    original.intermediate_time,
                    roundtripped.intermediate_time,
                    "{}", format
                );
                prop_assert_eq!(original.advanced_time, roundtripped.advanced_time, "{}", format);
                prop_assert_eq!(original.top_time, roundtripped.top_time, "{}", format);
                prop_assert_eq!(original.solved, roundtripped.solved, "{}", format);
                prop_assert_eq!(original.time_to_solve, roundtripped.time_to_solve, "{}", format);
                prop_assert!(
                    text_eq(original.pattern.as_deref(), roundtripped.pattern.as_deref()),
                    "{format} pattern: {:?} vs {:?}", original.pattern, roundtripped.pattern
                );
                prop_assert!(
                    text_eq(original.comments.as_deref(), roundtripped.comments.as_deref()),
                    "{format} comments: {:?} vs {:?}", original.comments, roundtripped.comments
                );
                prop_assert!(
                    text_eq(original.solved_date.as_deref(), roundtripped.solved_date.as_deref()),
                    "{format} solved_date: {:?} vs {:?}",
                    original.solved_date, roundtripped.solved_date
                );
            }
        }
    }

    /// Property: detection and parsing never panic, whatever the input.
    #[test]
    fn prop_detection_and_parsing_are_total(
        filename in proptest::option::of("[a-zA-Z0-9_.-]{1,30}"),
        content in "(?s).{0,400}"
    ) {
        let format = detect_format(filename.as_deref(), &content);
        let parsed = codec_for(format).parse(&content);
        // Malformed input degrades to an empty result, never a crash.
        prop_assert!(parsed.records.len() <= content.len() + 1);
    }

    /// Property: a format's own extension resolves back to it.
    #[test]
    fn prop_format_extension_roundtrips(idx in 0usize..5) {
        let format = Format::all()[idx];
        prop_assert_eq!(Format::from_extension(format.extension()), Some(format));
        prop_assert_eq!(format.extension().parse::<Format>().ok(), Some(format));
    }

    /// Property: mode and strategy tokens roundtrip through parse.
    #[test]
    fn prop_mode_and_strategy_tokens_roundtrip(mode_idx in 0usize..3, strategy_idx in 0usize..4) {
        let mode = Mode::all()[mode_idx];
        prop_assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        prop_assert_eq!(Mode::parse(&mode.as_str().to_uppercase()), Some(mode));

        let strategy = ConflictStrategy::all()[strategy_idx];
        prop_assert_eq!(ConflictStrategy::parse(strategy.as_str()), Some(strategy));
    }

    /// Property: projections only ever carry their mode's fields, and
    /// inference maps the projected shape back to the projecting mode.
    #[test]
    fn prop_projection_and_inference_agree(record in export_row()) {
        let problems = &filter_by_mode(std::slice::from_ref(&record), Mode::Problems)[0];
        prop_assert!(problems.solved.is_none());
        prop_assert!(problems.time_to_solve.is_none());
        prop_assert!(problems.comments.is_none());
        prop_assert!(problems.solved_date.is_none());
        prop_assert!(problems.last_modified.is_none());
        prop_assert_eq!(&problems.name, &record.name);
        prop_assert_eq!(detect_mode_from_fields(Some(problems)), Mode::Problems);

        let user = &filter_by_mode(std::slice::from_ref(&record), Mode::User)[0];
        prop_assert!(user.difficulty.is_none());
        prop_assert!(user.pattern.is_none());
        prop_assert!(user.list_id.is_none());
        prop_assert!(user.last_modified.is_none());
        prop_assert_eq!(detect_mode_from_fields(Some(user)), Mode::User);

        let full = &filter_by_mode(std::slice::from_ref(&record), Mode::Full)[0];
        prop_assert_eq!(full.difficulty, record.difficulty);
        prop_assert_eq!(full.solved, record.solved);
        prop_assert!(full.last_modified.is_none());
    }

    /// Property: normalized thresholds are strictly increasing, bounded,
    /// and a fixed point of normalization.
    #[test]
    fn prop_threshold_normalization(
        white in 0u32..1000,
        green in 0u32..1000,
        yellow in 0u32..1000,
        red in 0u32..1000,
        dark_red in 0u32..1000
    ) {
        let normalized = ThresholdSet { white, green, yellow, red, dark_red }.normalized();

        prop_assert!(normalized.white >= 1);
        prop_assert!(normalized.white < normalized.green);
        prop_assert!(normalized.green < normalized.yellow);
        prop_assert!(normalized.yellow < normalized.red);
        prop_assert!(normalized.red < normalized.dark_red);
        prop_assert!(normalized.dark_red <= ThresholdSet::MAX);

        prop_assert_eq!(normalized.normalized(), normalized);
    }

    /// Property: defaulted thresholds band every finite score somewhere.
    #[test]
    fn prop_every_score_lands_in_a_band(score in 0.0f64..10_000.0) {
        let thresholds = ThresholdSet::default();
        // Unsolved is reserved for the absent score.
        prop_assert_ne!(thresholds.band_for(Some(score)), Band::Unsolved);
        prop_assert_eq!(thresholds.band_for(None), Band::Unsolved);
    }
}
