//! Import and export service implementations.
//!
//! Orchestrates format detection, parsing, conflict resolution, and
//! storage writes.

pub mod export;
pub mod import;

pub use export::{ExportOptions, ExportResult, ExportService};
pub use import::{ImportOptions, ImportReport, ImportService, PendingConflict};
