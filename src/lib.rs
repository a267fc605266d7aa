//! # Codetrack
//!
//! Multi-format import/export engine for coding-interview progress tracking.
//!
//! Codetrack serializes problem lists and per-user progress to TSV, CSV,
//! JSON, XML, and YAML, parses all five back, and merges imported data into
//! an existing store under user-selected conflict-resolution strategies.
//!
//! ## Features
//!
//! - Five symmetric text codecs behind a single [`io::Codec`] trait
//! - Format detection from filename extension with content sniffing fallback
//! - Mode projections (`problems` / `user` / `full`) with mode inference
//! - Field-by-field conflict detection and deterministic merge resolution
//! - Progress propagation across lists sharing a problem name
//! - Awareness scoring for spaced-repetition review scheduling
//!
//! ## Example
//!
//! ```rust,ignore
//! use codetrack::{ImportService, ImportOptions, MemoryStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = ImportService::new(store);
//! let report = service.import_from_text(content, Some("backup.csv"), &ImportOptions::default())?;
//! println!("imported {} records", report.success_count);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod awareness;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::CodetrackConfig;
pub use io::{
    Codec, ConflictEntry, ExportOptions, ExportResult, ExportService, Field, Format,
    ImportOptions, ImportReport, ImportService, ParsedBundle, PendingConflict, codec_for,
    detect_format,
};
pub use models::{
    BundleRecord, ConflictStrategy, Difficulty, ExportBundle, ListMeta, Mode, ProblemId,
    ProblemRecord, ProgressRecord,
};
pub use storage::{MemoryStore, ProgressStore};

/// Error type for codetrack operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty import content, missing list addressing, bad strategy for resolution |
/// | `OperationFailed` | Filesystem I/O errors, poisoned store locks, snapshot write failures |
/// | `UnsupportedFormat` | Explicit format token matching no known codec |
/// | `ParseFailed` | Import content yields no records and the codec flagged it malformed |
/// | `NotFound` | Addressed list or problem does not exist where auto-creation is not allowed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Import content is empty or contains no importable records
    /// - A pending-conflict resolution is invoked with `AskEach`
    /// - Required addressing (target list) cannot be resolved
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem reads or writes fail
    /// - A store lock is poisoned
    /// - Snapshot serialization fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The requested interchange format is not recognized.
    ///
    /// Raised when:
    /// - An explicit format token matches no codec (detection never raises
    ///   this; it falls back to CSV)
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Content could not be parsed as the resolved format.
    ///
    /// Raised when:
    /// - A codec flagged the content malformed and produced zero records
    ///
    /// Partial parses never raise this; they degrade to the recovered
    /// records with a warning.
    #[error("could not parse content as {format}: {cause}")]
    ParseFailed {
        /// The format the content was parsed as.
        format: String,
        /// The underlying cause.
        cause: String,
    },

    /// A referenced list or problem does not exist.
    ///
    /// Raised when:
    /// - An export addresses a list the store does not contain
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type alias for codetrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Centralized so every `last_modified` stamp and bundle `exported_at` goes
/// through one clock read. Falls back to 0 if the system clock is before
/// the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use codetrack::current_timestamp_ms;
///
/// let ts = current_timestamp_ms();
/// assert!(ts > 0); // Should be a reasonable Unix timestamp
/// ```
#[must_use]
pub fn current_timestamp_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}
