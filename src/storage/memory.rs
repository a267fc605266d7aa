//! In-memory store with JSON snapshot persistence.

use crate::io::formats::{Codec, JsonCodec};
use crate::models::{
    BundleRecord, ExportBundle, ListMeta, Mode, ProblemId, ProblemRecord, ProgressRecord,
};
use crate::storage::ProgressStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// In-memory store backed by `RwLock`-guarded maps.
///
/// The CLI's working store: reloaded from a JSON snapshot at startup and
/// written back after mutating commands. Doubles as the test store for
/// the import and export services.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: RwLock<HashMap<String, ListMeta>>,
    problems: RwLock<HashMap<String, Vec<ProblemRecord>>>,
    progress: RwLock<HashMap<ProblemId, ProgressRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of lists.
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.lists.read().map(|lists| lists.len()).unwrap_or(0)
    }

    /// Returns the number of problems across all lists.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.problems
            .read()
            .map(|problems| problems.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns the number of progress rows.
    #[must_use]
    pub fn progress_count(&self) -> usize {
        self.progress.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Serializes the whole store as a full-mode JSON bundle.
    ///
    /// Snapshot rows carry `list_id` and `last_modified` so a reload
    /// keeps merge bookkeeping intact. Lists without problems are not
    /// represented and vanish on reload.
    pub fn to_snapshot(&self) -> Result<String> {
        let mut records = Vec::new();
        for list in self.get_all_lists()? {
            for problem in self.get_problems_for_list(&list.id)? {
                let mut record = BundleRecord::from(&problem);
                if let Some(progress) = self.get_progress(&problem.id)? {
                    record = record.with_progress(&progress);
                }
                records.push(record);
            }
        }
        Ok(JsonCodec.serialize(&ExportBundle::new(Mode::Full, records)))
    }

    /// Rebuilds a store from snapshot text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailed`] when the snapshot is not valid
    /// JSON.
    pub fn from_snapshot(text: &str) -> Result<Self> {
        let parsed = JsonCodec.parse(text);
        if let Some(cause) = parsed.error {
            return Err(Error::ParseFailed {
                format: "json".to_string(),
                cause,
            });
        }

        let store = Self::new();
        for record in parsed.records {
            // Snapshot rows without a list id cannot be placed; skip.
            let Some(list_id) = record.list_id.clone() else {
                continue;
            };
            if store.get_list(&list_id)?.is_none() {
                let sort_order = store.next_sort_order()?;
                store.insert_list(&ListMeta::new(&list_id).with_sort_order(sort_order))?;
            }

            let mut problem = ProblemRecord::new(&list_id, &record.name);
            if let Some(difficulty) = record.difficulty {
                problem.difficulty = difficulty;
            }
            problem.intermediate_time = record.intermediate_time;
            problem.advanced_time = record.advanced_time;
            problem.top_time = record.top_time;
            problem.pattern = record.pattern.clone().filter(|p| !p.is_empty());
            store.insert_problem(&problem)?;

            if record.has_user_fields() {
                let progress = ProgressRecord {
                    solved: record.solved.unwrap_or(false),
                    time_to_solve: record.time_to_solve,
                    comments: record.comments.clone().filter(|c| !c.is_empty()),
                    solved_date: record.solved_date.clone().filter(|d| !d.is_empty()),
                    last_modified: record.last_modified.unwrap_or(0),
                };
                store.upsert_progress(&problem.id, &progress)?;
            }
        }
        Ok(store)
    }

    /// Loads a store from a snapshot file, or an empty store when the
    /// file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Ok(Self::new()),
            Ok(text) => Self::from_snapshot(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(Error::OperationFailed {
                operation: "load_snapshot".to_string(),
                cause: e.to_string(),
            }),
        }
    }

    /// Writes the store to a snapshot file, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "save_snapshot".to_string(),
                cause: e.to_string(),
            })?;
        }
        std::fs::write(path, self.to_snapshot()?).map_err(|e| Error::OperationFailed {
            operation: "save_snapshot".to_string(),
            cause: e.to_string(),
        })
    }
}

impl ProgressStore for MemoryStore {
    fn get_problems_for_list(&self, list_id: &str) -> Result<Vec<ProblemRecord>> {
        let problems = self.problems.read().map_err(|_| Error::OperationFailed {
            operation: "get_problems_for_list".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        Ok(problems.get(list_id).cloned().unwrap_or_default())
    }

    fn get_problems_by_name(&self, name: &str) -> Result<Vec<ProblemRecord>> {
        let problems = self.problems.read().map_err(|_| Error::OperationFailed {
            operation: "get_problems_by_name".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        let mut matches: Vec<ProblemRecord> = problems
            .values()
            .flatten()
            .filter(|problem| problem.name == name)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.list_id.cmp(&b.list_id));
        Ok(matches)
    }

    fn get_all_lists(&self) -> Result<Vec<ListMeta>> {
        let lists = self.lists.read().map_err(|_| Error::OperationFailed {
            operation: "get_all_lists".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        let mut all: Vec<ListMeta> = lists.values().cloned().collect();
        all.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    fn get_progress(&self, id: &ProblemId) -> Result<Option<ProgressRecord>> {
        let progress = self.progress.read().map_err(|_| Error::OperationFailed {
            operation: "get_progress".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        Ok(progress.get(id).cloned())
    }

    fn upsert_progress(&self, id: &ProblemId, progress: &ProgressRecord) -> Result<()> {
        let mut rows = self.progress.write().map_err(|_| Error::OperationFailed {
            operation: "upsert_progress".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        rows.insert(id.clone(), progress.clone());
        Ok(())
    }

    fn insert_problem(&self, problem: &ProblemRecord) -> Result<()> {
        let mut problems = self.problems.write().map_err(|_| Error::OperationFailed {
            operation: "insert_problem".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        let list = problems.entry(problem.list_id.clone()).or_default();
        match list.iter_mut().find(|p| p.id == problem.id) {
            Some(existing) => *existing = problem.clone(),
            None => list.push(problem.clone()),
        }
        Ok(())
    }

    fn insert_list(&self, list: &ListMeta) -> Result<()> {
        let mut lists = self.lists.write().map_err(|_| Error::OperationFailed {
            operation: "insert_list".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        lists.insert(list.id.clone(), list.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_list(&ListMeta::new("blind_75").with_sort_order(0))
            .unwrap();
        store
            .insert_list(&ListMeta::new("neetcode_150").with_sort_order(1))
            .unwrap();
        store
            .insert_problem(
                &ProblemRecord::new("blind_75", "Two Sum")
                    .with_difficulty(Difficulty::Easy)
                    .with_tier_times(15, 10, 5)
                    .with_pattern("Hash Table"),
            )
            .unwrap();
        store
            .insert_problem(&ProblemRecord::new("blind_75", "Valid Anagram"))
            .unwrap();
        store
            .insert_problem(&ProblemRecord::new("neetcode_150", "Two Sum"))
            .unwrap();
        store
    }

    #[test]
    fn lists_are_ordered_by_sort_order() {
        let store = seeded_store();
        let lists = store.get_all_lists().unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].id, "blind_75");
        assert_eq!(lists[0].display_name, "Blind 75");
        assert_eq!(lists[1].id, "neetcode_150");
    }

    #[test]
    fn problems_keep_insertion_order() {
        let store = seeded_store();
        let problems = store.get_problems_for_list("blind_75").unwrap();
        assert_eq!(problems[0].name, "Two Sum");
        assert_eq!(problems[1].name, "Valid Anagram");
        assert!(store.get_problems_for_list("missing").unwrap().is_empty());
    }

    #[test]
    fn insert_replaces_same_id_in_place() {
        let store = seeded_store();
        let update = ProblemRecord::new("blind_75", "Two Sum").with_difficulty(Difficulty::Hard);
        store.insert_problem(&update).unwrap();

        let problems = store.get_problems_for_list("blind_75").unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].difficulty, Difficulty::Hard);
        assert_eq!(problems[0].name, "Two Sum");
    }

    #[test]
    fn finds_problems_by_name_across_lists() {
        let store = seeded_store();
        let matches = store.get_problems_by_name("Two Sum").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].list_id, "blind_75");
        assert_eq!(matches[1].list_id, "neetcode_150");
    }

    #[test]
    fn progress_roundtrip() {
        let store = seeded_store();
        let id = ProblemId::from_parts("blind_75", "Two Sum");
        assert!(store.get_progress(&id).unwrap().is_none());

        let mut progress = ProgressRecord::solved(12, "2024-01-15");
        progress.last_modified = 1_700_000_000_000;
        store.upsert_progress(&id, &progress).unwrap();
        assert_eq!(store.get_progress(&id).unwrap(), Some(progress));
    }

    #[test]
    fn snapshot_roundtrip_preserves_rows_and_stamps() {
        let store = seeded_store();
        let id = ProblemId::from_parts("blind_75", "Two Sum");
        let mut progress = ProgressRecord::solved(12, "2024-01-15");
        progress.last_modified = 1_700_000_000_000;
        store.upsert_progress(&id, &progress).unwrap();

        let reloaded = MemoryStore::from_snapshot(&store.to_snapshot().unwrap()).unwrap();
        assert_eq!(reloaded.list_count(), 2);
        assert_eq!(reloaded.problem_count(), 3);
        assert_eq!(reloaded.progress_count(), 1);

        let problem = &reloaded.get_problems_for_list("blind_75").unwrap()[0];
        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.intermediate_time, Some(15));
        assert_eq!(problem.pattern.as_deref(), Some("Hash Table"));
        assert_eq!(reloaded.get_progress(&id).unwrap(), Some(progress));
    }

    #[test]
    fn snapshot_files_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("snapshot.json");

        let missing = MemoryStore::load_from_path(&path).unwrap();
        assert_eq!(missing.list_count(), 0);

        seeded_store().save_to_path(&path).unwrap();
        let reloaded = MemoryStore::load_from_path(&path).unwrap();
        assert_eq!(reloaded.problem_count(), 3);
    }

    #[test]
    fn corrupt_snapshot_is_a_parse_failure() {
        assert!(matches!(
            MemoryStore::from_snapshot("{corrupt"),
            Err(Error::ParseFailed { .. })
        ));
    }
}
