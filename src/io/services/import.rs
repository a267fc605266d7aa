//! Bundle import service.
//!
//! Parses text in any supported format, diffs the records against the
//! store, applies the selected conflict strategy, and writes the outcome
//! back record by record.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use crate::io::conflict::{ConflictEntry, detect_conflicts};
use crate::io::detect::detect_format;
use crate::io::formats::{Format, codec_for};
use crate::models::{BundleRecord, ConflictStrategy, ListMeta, Mode, ProblemRecord};
use crate::storage::ProgressStore;
use crate::{Error, Result};

/// Options for a bundle import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Explicit format; `None` detects from filename and content.
    pub format: Option<Format>,
    /// Explicit mode; `None` uses the bundle's declared or inferred mode.
    pub mode: Option<Mode>,
    /// Target list; `None` uses the bundle's addressing.
    pub list_id: Option<String>,
    /// How conflicting records are resolved.
    pub strategy: ConflictStrategy,
}

impl ImportOptions {
    /// Sets an explicit format, bypassing detection.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets an explicit mode, overriding the bundle's declaration.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Addresses a target list.
    #[must_use]
    pub fn with_list_id(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    /// Sets the conflict strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A conflicting record deferred by [`ConflictStrategy::AskEach`].
#[derive(Debug, Clone)]
pub struct PendingConflict {
    /// The imported record, unapplied.
    pub record: BundleRecord,
    /// The field differences that deferred it.
    pub conflict: ConflictEntry,
}

/// Result of an import operation.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Format the content was parsed as.
    pub format: Format,
    /// Mode the records were applied under.
    pub mode: Mode,
    /// Batch target list, when one was resolved.
    pub list_id: Option<String>,
    /// Records written (added or updated).
    pub success_count: usize,
    /// Records that errored individually.
    pub failed_count: usize,
    /// Records skipped by strategy or addressing.
    pub skipped_count: usize,
    /// Per-record error messages.
    pub errors: Vec<String>,
    /// Non-fatal notes (partial parses, skipped names).
    pub warnings: Vec<String>,
    /// Conflicts deferred for a caller decision.
    pub pending: Vec<PendingConflict>,
}

impl ImportReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new(format: Format, mode: Mode) -> Self {
        Self {
            format,
            mode,
            list_id: None,
            success_count: 0,
            failed_count: 0,
            skipped_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Returns whether any records were written.
    #[must_use]
    pub const fn has_imports(&self) -> bool {
        self.success_count > 0
    }

    /// Returns whether any records errored.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.failed_count > 0 || !self.errors.is_empty()
    }

    /// Returns whether conflicts await a caller decision.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// What applying one record did.
enum Applied {
    Written,
    Skipped,
    UnknownName,
    Deferred(ConflictEntry),
}

/// Service for importing progress bundles.
pub struct ImportService {
    /// Store the imported records are merged into.
    store: Arc<dyn ProgressStore>,
}

impl ImportService {
    /// Creates a new import service.
    #[must_use]
    pub const fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Imports a bundle from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or under the same
    /// conditions as [`Self::import_from_text`].
    pub fn import_from_path(&self, path: &Path, options: &ImportOptions) -> Result<ImportReport> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_import_file".to_string(),
            cause: e.to_string(),
        })?;
        let filename = path.file_name().and_then(|n| n.to_str());
        self.import_from_text(&content, filename, options)
    }

    /// Imports a bundle from text.
    ///
    /// The filename, when known, feeds format detection and serves as the
    /// fallback list key for bundles that carry no addressing.
    ///
    /// Parsing is total per record: a malformed row becomes a warning and
    /// the rest of the file still imports. Whole-file failures are the only
    /// errors: empty content, content that parses to nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] when the content is empty or yields no
    ///   records.
    /// - [`Error::ParseFailed`] when the content is malformed for the
    ///   resolved format and nothing was recoverable.
    #[instrument(skip(self, content), fields(strategy = %options.strategy))]
    pub fn import_from_text(
        &self,
        content: &str,
        filename: Option<&str>,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("import content is empty".to_string()));
        }

        let format = options
            .format
            .unwrap_or_else(|| detect_format(filename, content));
        let parsed = codec_for(format).parse(content);

        if parsed.records.is_empty() {
            if let Some(cause) = parsed.error {
                return Err(Error::ParseFailed {
                    format: format.to_string(),
                    cause,
                });
            }
            return Err(Error::InvalidInput(
                "no importable records found".to_string(),
            ));
        }

        let mode = options.mode.or(parsed.mode).unwrap_or_default();
        let batch_list = options
            .list_id
            .clone()
            .or_else(|| parsed.file_key.clone())
            .or_else(|| {
                // Progress rows match by name across lists; only bundles
                // that may create problems need a key derived from the
                // filename.
                if mode == Mode::User {
                    None
                } else {
                    filename.map(derive_list_id).filter(|id| !id.is_empty())
                }
            });

        let mut report = ImportReport::new(format, mode);
        report.list_id.clone_from(&batch_list);
        if let Some(cause) = &parsed.error {
            report.warnings.push(format!("partial parse: {cause}"));
        }

        let conflicts: HashMap<String, ConflictEntry> =
            detect_conflicts(self.store.as_ref(), batch_list.as_deref(), &parsed.records, mode)?
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect();

        for (index, record) in parsed.records.iter().enumerate() {
            let row = index + 1;
            if record.name.trim().is_empty() {
                report.failed_count += 1;
                report.errors.push(format!("Record {row}: missing problem name"));
                continue;
            }
            let conflict = conflicts.get(&record.name);
            match self.apply_record(record, mode, batch_list.as_deref(), conflict, options.strategy)
            {
                Ok(Applied::Written) => report.success_count += 1,
                Ok(Applied::Skipped) => report.skipped_count += 1,
                Ok(Applied::UnknownName) => {
                    report.skipped_count += 1;
                    report.warnings.push(format!(
                        "Record {row}: no existing problem named '{}'",
                        record.name
                    ));
                }
                Ok(Applied::Deferred(conflict)) => report.pending.push(PendingConflict {
                    record: record.clone(),
                    conflict,
                }),
                Err(e) => {
                    report.failed_count += 1;
                    report.errors.push(format!("Record {row}: {e}"));
                }
            }
        }

        tracing::info!(
            format = %report.format,
            mode = %report.mode,
            success = report.success_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            pending = report.pending.len(),
            "Import finished"
        );

        Ok(report)
    }

    /// Applies a strategy to conflicts deferred by a previous import.
    ///
    /// Every pending record is treated as conflicting and resolved
    /// uniformly. Counts in the returned report cover the pending set only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `strategy` is
    /// [`ConflictStrategy::AskEach`], which cannot decide anything.
    pub fn resolve_pending(
        &self,
        report: &ImportReport,
        strategy: ConflictStrategy,
    ) -> Result<ImportReport> {
        if strategy == ConflictStrategy::AskEach {
            return Err(Error::InvalidInput(
                "pending conflicts need a deciding strategy".to_string(),
            ));
        }

        let mut resolved = ImportReport::new(report.format, report.mode);
        resolved.list_id.clone_from(&report.list_id);

        for (index, pending) in report.pending.iter().enumerate() {
            let row = index + 1;
            match self.apply_record(
                &pending.record,
                report.mode,
                report.list_id.as_deref(),
                Some(&pending.conflict),
                strategy,
            ) {
                Ok(Applied::Written) => resolved.success_count += 1,
                Ok(Applied::Skipped | Applied::UnknownName) => resolved.skipped_count += 1,
                // apply_record never defers under the three deciding
                // strategies.
                Ok(Applied::Deferred(_)) => resolved.skipped_count += 1,
                Err(e) => {
                    resolved.failed_count += 1;
                    resolved.errors.push(format!("Record {row}: {e}"));
                }
            }
        }

        Ok(resolved)
    }

    fn apply_record(
        &self,
        record: &BundleRecord,
        mode: Mode,
        batch_list: Option<&str>,
        conflict: Option<&ConflictEntry>,
        strategy: ConflictStrategy,
    ) -> Result<Applied> {
        let matches = self.target_problems(batch_list, record)?;

        if matches.is_empty() {
            if mode == Mode::User {
                return Ok(Applied::UnknownName);
            }
            let Some(list_id) = record.list_id.as_deref().or(batch_list) else {
                return Err(Error::InvalidInput(
                    "no target list for new problem".to_string(),
                ));
            };
            self.ensure_list(list_id)?;
            let problem = problem_from_record(list_id, record);
            self.store.insert_problem(&problem)?;
            if record.has_user_fields() {
                self.write_progress(&problem, record)?;
            }
            return Ok(Applied::Written);
        }

        if let Some(conflict) = conflict {
            match strategy {
                ConflictStrategy::ReplaceAll => {}
                ConflictStrategy::SkipAll => return Ok(Applied::Skipped),
                ConflictStrategy::AskEach => return Ok(Applied::Deferred(conflict.clone())),
                ConflictStrategy::MergeAll => {
                    if !self.imported_is_newer(record, &matches)? {
                        return Ok(Applied::Skipped);
                    }
                }
            }
        }

        self.update_problems(&matches, record, mode)?;
        if mode != Mode::Problems && record.has_user_fields() {
            self.write_progress(&matches[0], record)?;
        }
        Ok(Applied::Written)
    }

    /// Stored rows a record addresses: the matching row in its target
    /// list, or every same-name row when the batch is unaddressed.
    fn target_problems(
        &self,
        batch_list: Option<&str>,
        record: &BundleRecord,
    ) -> Result<Vec<ProblemRecord>> {
        match record.list_id.as_deref().or(batch_list) {
            Some(list_id) => Ok(self
                .store
                .get_problems_for_list(list_id)?
                .into_iter()
                .filter(|p| p.name == record.name)
                .collect()),
            None => self.store.get_problems_by_name(&record.name),
        }
    }

    /// Merge tie-break: the imported side wins only with a strictly
    /// greater `last_modified`. Absent stamps never win.
    fn imported_is_newer(
        &self,
        record: &BundleRecord,
        matches: &[ProblemRecord],
    ) -> Result<bool> {
        let Some(imported_stamp) = record.last_modified else {
            return Ok(false);
        };
        let mut existing_stamp = 0;
        for problem in matches {
            if let Some(progress) = self.store.get_progress(&problem.id)? {
                existing_stamp = existing_stamp.max(progress.last_modified);
            }
        }
        Ok(imported_stamp > existing_stamp)
    }

    fn ensure_list(&self, list_id: &str) -> Result<()> {
        if self.store.list_exists(list_id)? {
            return Ok(());
        }
        let sort_order = self.store.next_sort_order()?;
        self.store
            .insert_list(&ListMeta::new(list_id).with_sort_order(sort_order))?;
        tracing::info!(list_id, "Created list for import");
        Ok(())
    }

    fn update_problems(
        &self,
        matches: &[ProblemRecord],
        record: &BundleRecord,
        mode: Mode,
    ) -> Result<()> {
        if mode == Mode::User {
            return Ok(());
        }
        for problem in matches {
            let mut updated = problem.clone();
            if let Some(difficulty) = record.difficulty {
                updated.difficulty = difficulty;
            }
            if let Some(minutes) = record.intermediate_time {
                updated.intermediate_time = Some(minutes);
            }
            if let Some(minutes) = record.advanced_time {
                updated.advanced_time = Some(minutes);
            }
            if let Some(minutes) = record.top_time {
                updated.top_time = Some(minutes);
            }
            if let Some(pattern) = &record.pattern {
                updated.pattern = Some(pattern.clone()).filter(|p| !p.is_empty());
            }
            if updated != *problem {
                self.store.insert_problem(&updated)?;
            }
        }
        Ok(())
    }

    /// Overlays the record's user fields onto stored progress and writes
    /// the result to every list-scoped row sharing the name.
    fn write_progress(&self, anchor: &ProblemRecord, record: &BundleRecord) -> Result<()> {
        let mut next = self.store.get_progress(&anchor.id)?.unwrap_or_default();
        if let Some(solved) = record.solved {
            next.solved = solved;
        }
        if let Some(minutes) = record.time_to_solve {
            next.time_to_solve = Some(minutes);
        }
        if let Some(comments) = &record.comments {
            next.comments = Some(comments.clone()).filter(|c| !c.is_empty());
        }
        if let Some(date) = &record.solved_date {
            next.solved_date = Some(date.clone()).filter(|d| !d.is_empty());
        }
        next.last_modified = crate::current_timestamp_ms();

        let mut shared = self.store.get_problems_by_name(&anchor.name)?;
        if shared.is_empty() {
            shared.push(anchor.clone());
        }
        for problem in &shared {
            self.store.upsert_progress(&problem.id, &next)?;
        }
        Ok(())
    }
}

/// Builds a storable problem from an imported record, defaults filling
/// the absent fields.
fn problem_from_record(list_id: &str, record: &BundleRecord) -> ProblemRecord {
    let mut problem = ProblemRecord::new(list_id, record.name.trim());
    if let Some(difficulty) = record.difficulty {
        problem.difficulty = difficulty;
    }
    problem.intermediate_time = record.intermediate_time;
    problem.advanced_time = record.advanced_time;
    problem.top_time = record.top_time;
    problem.pattern = record.pattern.clone().filter(|p| !p.is_empty());
    problem
}

/// Derives a list key from a filename, as `Backup List.csv` ->
/// `backup_list`.
fn derive_list_id(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem);
    stem.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
