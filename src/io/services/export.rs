//! Bundle export service.
//!
//! Assembles store rows into an [`ExportBundle`], projects them onto the
//! requested mode, and serializes through the format's codec.

use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use crate::io::formats::{Format, codec_for};
use crate::io::mode::filter_by_mode;
use crate::models::{BundleRecord, ExportBundle, Mode};
use crate::storage::ProgressStore;
use crate::{Error, Result};

/// Options for a bundle export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Serialization format.
    pub format: Format,
    /// Field projection applied to every record.
    pub mode: Mode,
    /// Restricts the export to one list; `None` exports every list.
    pub list_id: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: Format::Json,
            mode: Mode::Full,
            list_id: None,
        }
    }
}

impl ExportOptions {
    /// Sets the serialization format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets the field projection.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Addresses a single list.
    #[must_use]
    pub fn with_list_id(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }
}

/// Result of an export operation.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Serialized bundle text.
    pub content: String,
    /// Format the bundle was written in.
    pub format: Format,
    /// Field projection the records carry.
    pub mode: Mode,
    /// Number of records in the bundle.
    pub record_count: usize,
    /// Download name a caller should offer for the content.
    pub suggested_filename: String,
    /// Destination path (if file export).
    pub output_path: Option<String>,
}

impl ExportResult {
    /// Returns whether any records were exported.
    #[must_use]
    pub const fn has_records(&self) -> bool {
        self.record_count > 0
    }
}

/// Service for exporting progress bundles.
pub struct ExportService {
    /// Store the exported rows are read from.
    store: Arc<dyn ProgressStore>,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Exports a bundle to a file.
    ///
    /// The write goes through a sibling temp file and a rename, so a failed
    /// export never leaves a truncated bundle at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the addressed list does not exist, the store
    /// fails, or the file cannot be written.
    pub fn export_to_file(&self, path: &Path, options: &ExportOptions) -> Result<ExportResult> {
        let format = if options.format == Format::Json {
            // Auto-detect from extension if using default
            Format::from_path(path).unwrap_or(Format::Json)
        } else {
            options.format
        };

        let mut result = self.export_to_string(&options.clone().with_format(format))?;
        write_replacing(path, &result.content)?;
        result.output_path = Some(path.display().to_string());
        Ok(result)
    }

    /// Exports a bundle as serialized text.
    ///
    /// Every stored row carries its progress overlay, defaulted when no
    /// progress was ever recorded, so full and user exports always show the
    /// user columns. User mode keeps solved rows only, de-duplicated by
    /// name: propagation keeps same-name rows identical, so one survives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the addressed list does not exist,
    /// or a store error.
    #[instrument(skip(self), fields(format = %options.format, mode = %options.mode))]
    pub fn export_to_string(&self, options: &ExportOptions) -> Result<ExportResult> {
        let mut records = match options.list_id.as_deref() {
            Some(list_id) => {
                if !self.store.list_exists(list_id)? {
                    return Err(Error::NotFound(format!("list '{list_id}'")));
                }
                self.rows_for_list(list_id)?
            }
            None => {
                let mut rows = Vec::new();
                for list in self.store.get_all_lists()? {
                    rows.extend(self.rows_for_list(&list.id)?);
                }
                rows
            }
        };

        if options.mode == Mode::User {
            records = solved_only_deduped(records);
        }
        let mut records = filter_by_mode(&records, options.mode);
        if options.list_id.is_some() {
            // The bundle fileKey addresses the list; rows do not repeat it.
            for record in &mut records {
                record.list_id = None;
            }
        }

        let record_count = records.len();
        let mut bundle = ExportBundle::new(options.mode, records);
        if let Some(list_id) = &options.list_id {
            bundle = bundle.with_list_id(list_id.clone());
        }
        let content = codec_for(options.format).serialize(&bundle);
        let suggested_filename = suggested_filename(options, bundle.exported_at);

        tracing::info!(
            records = record_count,
            filename = %suggested_filename,
            "Exported bundle"
        );

        Ok(ExportResult {
            content,
            format: options.format,
            mode: options.mode,
            record_count,
            suggested_filename,
            output_path: None,
        })
    }

    fn rows_for_list(&self, list_id: &str) -> Result<Vec<BundleRecord>> {
        let problems = self.store.get_problems_for_list(list_id)?;
        let mut rows = Vec::with_capacity(problems.len());
        for problem in &problems {
            let progress = self.store.get_progress(&problem.id)?.unwrap_or_default();
            rows.push(BundleRecord::from(problem).with_progress(&progress));
        }
        Ok(rows)
    }
}

fn solved_only_deduped(rows: Vec<BundleRecord>) -> Vec<BundleRecord> {
    let mut seen = std::collections::HashSet::new();
    rows.into_iter()
        .filter(|row| row.solved == Some(true))
        .filter(|row| seen.insert(row.name.clone()))
        .collect()
}

/// Builds the `coding_tracker_{scope}_{yyyyMMdd_HHmmss}.{ext}` name.
///
/// Scope is the addressed list id; all-lists exports use `progress` for
/// user mode and `problems` otherwise.
fn suggested_filename(options: &ExportOptions, exported_at: i64) -> String {
    let scope = options.list_id.as_deref().unwrap_or(match options.mode {
        Mode::User => "progress",
        Mode::Problems | Mode::Full => "problems",
    });
    let stamp = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(exported_at)
        .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_default();
    format!("coding_tracker_{scope}_{stamp}.{}", options.format.extension())
}

fn write_replacing(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_export_dir".to_string(),
                cause: e.to_string(),
            })?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|e| Error::OperationFailed {
        operation: "write_export_file".to_string(),
        cause: e.to_string(),
    })?;
    std::fs::rename(&tmp, path).map_err(|e| Error::OperationFailed {
        operation: "write_export_file".to_string(),
        cause: e.to_string(),
    })
}
