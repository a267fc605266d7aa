//! Storage trait for problem lists and progress.

use crate::Result;
use crate::models::{ListMeta, ProblemId, ProblemRecord, ProgressRecord};

/// Trait for stores holding problem lists and per-user progress.
///
/// The store is the authoritative source the import and export services
/// read and write. All methods take `&self`; implementations handle
/// their own interior mutability and must be safe to share across
/// threads.
pub trait ProgressStore: Send + Sync {
    /// Returns the problems in a list, in list order.
    fn get_problems_for_list(&self, list_id: &str) -> Result<Vec<ProblemRecord>>;

    /// Returns every problem with the given name across all lists,
    /// ordered by list id.
    fn get_problems_by_name(&self, name: &str) -> Result<Vec<ProblemRecord>>;

    /// Returns all list metadata, ordered by sort order.
    fn get_all_lists(&self) -> Result<Vec<ListMeta>>;

    /// Retrieves progress for a problem. `None` means never written.
    fn get_progress(&self, id: &ProblemId) -> Result<Option<ProgressRecord>>;

    /// Inserts or replaces progress for a problem.
    fn upsert_progress(&self, id: &ProblemId, progress: &ProgressRecord) -> Result<()>;

    /// Inserts a problem, replacing a same-id problem in place.
    fn insert_problem(&self, problem: &ProblemRecord) -> Result<()>;

    /// Inserts list metadata, replacing a same-id entry.
    fn insert_list(&self, list: &ListMeta) -> Result<()>;

    /// Retrieves one list's metadata.
    fn get_list(&self, list_id: &str) -> Result<Option<ListMeta>> {
        Ok(self
            .get_all_lists()?
            .into_iter()
            .find(|list| list.id == list_id))
    }

    /// Checks if a list exists.
    fn list_exists(&self, list_id: &str) -> Result<bool> {
        Ok(self.get_list(list_id)?.is_some())
    }

    /// Returns every problem across all lists, list by list.
    fn get_all_problems(&self) -> Result<Vec<ProblemRecord>> {
        let mut problems = Vec::new();
        for list in self.get_all_lists()? {
            problems.extend(self.get_problems_for_list(&list.id)?);
        }
        Ok(problems)
    }

    /// Returns the sort order for a newly appended list.
    fn next_sort_order(&self) -> Result<u32> {
        Ok(self
            .get_all_lists()?
            .iter()
            .map(|list| list.sort_order)
            .max()
            .map_or(0, |highest| highest + 1))
    }
}
