//! End-to-end import/export tests.
//!
//! Exercises the full pipeline through the public API: store -> export ->
//! serialized text -> import -> store, including format roundtrips,
//! conflict strategies, duplicate-name propagation, and snapshot
//! persistence.

// Tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use codetrack::{
    ConflictStrategy, Difficulty, ExportOptions, ExportService, Format, ImportOptions,
    ImportService, ListMeta, MemoryStore, Mode, ProblemRecord, ProgressRecord, ProgressStore,
};
use std::sync::Arc;

/// Two lists sharing one solved problem name, plus an unsolved problem.
fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .insert_list(&ListMeta::new("blind_75").with_sort_order(1))
        .unwrap();
    store
        .insert_list(&ListMeta::new("neetcode_150").with_sort_order(2))
        .unwrap();

    let two_sum = ProblemRecord::new("blind_75", "Two Sum")
        .with_difficulty(Difficulty::Easy)
        .with_tier_times(15, 10, 6)
        .with_pattern("Hash Map");
    store.insert_problem(&two_sum).unwrap();
    store
        .upsert_progress(&two_sum.id, &ProgressRecord::solved(12, "2025-01-15"))
        .unwrap();

    let lru = ProblemRecord::new("blind_75", "LRU Cache").with_difficulty(Difficulty::Medium);
    store.insert_problem(&lru).unwrap();

    let two_sum_nc = ProblemRecord::new("neetcode_150", "Two Sum")
        .with_difficulty(Difficulty::Easy)
        .with_pattern("Hash Map");
    store.insert_problem(&two_sum_nc).unwrap();
    store
        .upsert_progress(&two_sum_nc.id, &ProgressRecord::solved(12, "2025-01-15"))
        .unwrap();

    Arc::new(store)
}

fn export_service(store: &Arc<MemoryStore>) -> ExportService {
    ExportService::new(Arc::clone(store) as Arc<dyn ProgressStore>)
}

fn import_service(store: &Arc<MemoryStore>) -> ImportService {
    ImportService::new(Arc::clone(store) as Arc<dyn ProgressStore>)
}

#[test]
fn test_envelope_formats_roundtrip_all_lists() {
    // JSON, XML, and YAML rows carry their list id, so a merged export
    // regroups into the original lists on import.
    for format in [Format::Json, Format::Xml, Format::Yaml] {
        let source = seeded_store();
        let exported = export_service(&source)
            .export_to_string(&ExportOptions::default().with_format(format))
            .unwrap();

        let target = Arc::new(MemoryStore::new());
        let report = import_service(&target)
            .import_from_text(&exported.content, None, &ImportOptions::default())
            .unwrap();

        assert_eq!(report.failed_count, 0, "{format}: {:?}", report.errors);
        assert_eq!(report.success_count, 3, "{format}");
        assert_eq!(report.mode, Mode::Full, "{format}");

        let lists: Vec<String> = target
            .get_all_lists()
            .unwrap()
            .into_iter()
            .map(|list| list.id)
            .collect();
        assert!(lists.contains(&"blind_75".to_string()), "{format}");
        assert!(lists.contains(&"neetcode_150".to_string()), "{format}");
        assert_eq!(lists.len(), 2, "{format}");

        let blind = target.get_problems_for_list("blind_75").unwrap();
        assert_eq!(blind.len(), 2, "{format}");
        let two_sum = blind.iter().find(|p| p.name == "Two Sum").unwrap();
        assert_eq!(two_sum.difficulty, Difficulty::Easy, "{format}");
        assert_eq!(two_sum.intermediate_time, Some(15), "{format}");
        assert_eq!(two_sum.top_time, Some(6), "{format}");
        assert_eq!(two_sum.pattern.as_deref(), Some("Hash Map"), "{format}");

        let progress = target.get_progress(&two_sum.id).unwrap().unwrap();
        assert!(progress.solved, "{format}");
        assert_eq!(progress.time_to_solve, Some(12), "{format}");
        assert_eq!(progress.solved_date.as_deref(), Some("2025-01-15"), "{format}");

        let lru = blind.iter().find(|p| p.name == "LRU Cache").unwrap();
        let lru_progress = target.get_progress(&lru.id).unwrap().unwrap();
        assert!(!lru_progress.solved, "{format}");
        assert_eq!(lru_progress.time_to_solve, None, "{format}");
    }
}

#[test]
fn test_tabular_formats_roundtrip_addressed_list() {
    // TSV and CSV use fixed mode columns without a list column; the
    // addressed-list metadata comment carries the target instead.
    for format in [Format::Tsv, Format::Csv] {
        let source = seeded_store();
        let exported = export_service(&source)
            .export_to_string(
                &ExportOptions::default()
                    .with_format(format)
                    .with_list_id("blind_75"),
            )
            .unwrap();

        let target = Arc::new(MemoryStore::new());
        let report = import_service(&target)
            .import_from_text(&exported.content, None, &ImportOptions::default())
            .unwrap();

        assert_eq!(report.failed_count, 0, "{format}: {:?}", report.errors);
        assert_eq!(report.success_count, 2, "{format}");
        assert_eq!(report.list_id.as_deref(), Some("blind_75"), "{format}");

        let blind = target.get_problems_for_list("blind_75").unwrap();
        assert_eq!(blind.len(), 2, "{format}");
        let two_sum = blind.iter().find(|p| p.name == "Two Sum").unwrap();
        assert_eq!(two_sum.difficulty, Difficulty::Easy, "{format}");
        let progress = target.get_progress(&two_sum.id).unwrap().unwrap();
        assert!(progress.solved, "{format}");
        assert_eq!(progress.time_to_solve, Some(12), "{format}");
    }
}

#[test]
fn test_export_to_file_and_import_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.yaml");

    let source = seeded_store();
    let result = export_service(&source)
        .export_to_file(&path, &ExportOptions::default())
        .unwrap();
    assert_eq!(result.format, Format::Yaml);
    assert_eq!(result.record_count, 3);

    let target = Arc::new(MemoryStore::new());
    let report = import_service(&target)
        .import_from_path(&path, &ImportOptions::default())
        .unwrap();

    assert_eq!(report.format, Format::Yaml);
    assert_eq!(report.success_count, 3);
    // Rows carry their own lists; the filename stem never becomes one.
    assert_eq!(target.get_all_lists().unwrap().len(), 2);
}

#[test]
fn test_user_progress_transfers_across_different_lists() {
    // A user-mode export matches problems by name on the target, even
    // when the target organizes them into entirely different lists.
    for format in [Format::Csv, Format::Json] {
        let source = seeded_store();
        let exported = export_service(&source)
            .export_to_string(
                &ExportOptions::default()
                    .with_format(format)
                    .with_mode(Mode::User),
            )
            .unwrap();
        assert_eq!(exported.record_count, 1, "{format}: solved rows dedupe");

        let target = Arc::new(MemoryStore::new());
        target.insert_list(&ListMeta::new("grind_75")).unwrap();
        let two_sum = ProblemRecord::new("grind_75", "Two Sum");
        target.insert_problem(&two_sum).unwrap();
        let anagram = ProblemRecord::new("grind_75", "Valid Anagram");
        target.insert_problem(&anagram).unwrap();

        let options = ImportOptions::default().with_strategy(ConflictStrategy::ReplaceAll);
        let report = import_service(&target)
            .import_from_text(&exported.content, Some("progress.csv"), &options)
            .unwrap();

        assert_eq!(report.mode, Mode::User, "{format}");
        assert_eq!(report.success_count, 1, "{format}");
        assert_eq!(report.failed_count, 0, "{format}: {:?}", report.errors);

        // Progress lands on the name match; nothing new is created.
        assert_eq!(target.get_problems_for_list("grind_75").unwrap().len(), 2);
        let progress = target.get_progress(&two_sum.id).unwrap().unwrap();
        assert!(progress.solved, "{format}");
        assert_eq!(progress.time_to_solve, Some(12), "{format}");
        assert!(target.get_progress(&anagram.id).unwrap().is_none(), "{format}");
    }
}

#[test]
fn test_merge_strategy_round_trips_through_stamps() {
    let store = seeded_store();
    let service = import_service(&store);
    let options = ImportOptions::default().with_strategy(ConflictStrategy::MergeAll);

    // Seeded progress carries stamp 0, so any imported stamp wins.
    let first = r#"[{"name": "Two Sum", "solved": true, "timeToSolve": 30, "lastModified": 99}]"#;
    let report = service
        .import_from_text(first, None, &options)
        .unwrap();
    assert_eq!(report.success_count, 1);

    let blind = store.get_problems_for_list("blind_75").unwrap();
    let two_sum = blind.iter().find(|p| p.name == "Two Sum").unwrap();
    assert_eq!(
        store
            .get_progress(&two_sum.id)
            .unwrap()
            .unwrap()
            .time_to_solve,
        Some(30)
    );
    // Propagated to the duplicate name in the other list.
    let neetcode = store.get_problems_for_list("neetcode_150").unwrap();
    let two_sum_nc = neetcode.iter().find(|p| p.name == "Two Sum").unwrap();
    assert_eq!(
        store
            .get_progress(&two_sum_nc.id)
            .unwrap()
            .unwrap()
            .time_to_solve,
        Some(30)
    );

    // The write stamped current time, so an old stamp now loses.
    let second = r#"[{"name": "Two Sum", "solved": true, "timeToSolve": 55, "lastModified": 100}]"#;
    let report = service
        .import_from_text(second, None, &options)
        .unwrap();
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.success_count, 0);
    assert_eq!(
        store
            .get_progress(&two_sum.id)
            .unwrap()
            .unwrap()
            .time_to_solve,
        Some(30)
    );
}

#[test]
fn test_deferred_conflicts_resolve_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");

    let store = seeded_store();
    store.save_to_path(&snapshot).unwrap();

    // Reload from disk and apply a conflicting problem-side change.
    let store = Arc::new(MemoryStore::load_from_path(&snapshot).unwrap());
    let service = import_service(&store);
    let doc = r#"{
        "fileKey": "blind_75",
        "mode": "problems",
        "problems": [{"name": "Two Sum", "difficulty": "Hard"}]
    }"#;

    let report = service
        .import_from_text(doc, None, &ImportOptions::default())
        .unwrap();
    assert!(report.has_pending());
    assert_eq!(report.success_count, 0);

    let resolved = service
        .resolve_pending(&report, ConflictStrategy::ReplaceAll)
        .unwrap();
    assert_eq!(resolved.success_count, 1);
    store.save_to_path(&snapshot).unwrap();

    let reloaded = MemoryStore::load_from_path(&snapshot).unwrap();
    let blind = reloaded.get_problems_for_list("blind_75").unwrap();
    let two_sum = blind.iter().find(|p| p.name == "Two Sum").unwrap();
    assert_eq!(two_sum.difficulty, Difficulty::Hard);

    // The addressed import never touched the duplicate in the other list.
    let neetcode = reloaded.get_problems_for_list("neetcode_150").unwrap();
    let two_sum_nc = neetcode.iter().find(|p| p.name == "Two Sum").unwrap();
    assert_eq!(two_sum_nc.difficulty, Difficulty::Easy);

    // Progress survived both the import and the snapshot roundtrip.
    let progress = reloaded.get_progress(&two_sum.id).unwrap().unwrap();
    assert!(progress.solved);
    assert_eq!(progress.time_to_solve, Some(12));
}

#[test]
fn test_problems_mode_import_never_touches_progress() {
    let store = seeded_store();
    let service = import_service(&store);

    let doc = r#"{
        "fileKey": "blind_75",
        "mode": "problems",
        "problems": [
            {"name": "Two Sum", "difficulty": "Easy", "pattern": "Two Pointers",
             "solved": false, "timeToSolve": 999}
        ]
    }"#;
    let options = ImportOptions::default().with_strategy(ConflictStrategy::ReplaceAll);
    let report = service.import_from_text(doc, None, &options).unwrap();
    assert_eq!(report.success_count, 1);

    let blind = store.get_problems_for_list("blind_75").unwrap();
    let two_sum = blind.iter().find(|p| p.name == "Two Sum").unwrap();
    assert_eq!(two_sum.pattern.as_deref(), Some("Two Pointers"));

    // The user columns in the source are ignored in problems mode.
    let progress = store.get_progress(&two_sum.id).unwrap().unwrap();
    assert!(progress.solved);
    assert_eq!(progress.time_to_solve, Some(12));
}
