//! Import/export I/O subsystem.
//!
//! Serializes progress bundles to interchange formats, parses them back,
//! and merges imported data into the store.
//!
//! # Architecture
//!
//! - **Field model** maps canonical fields to each format's headers and
//!   coerces raw text to typed values
//! - **Format codecs** implement the [`Codec`] trait, one per format
//! - **Mode filter** projects records onto the `problems`/`user`/`full`
//!   field subsets and infers the mode of untagged files
//! - **Conflict detection and services** diff imported records against
//!   the store and apply a resolution strategy
//!
//! # Supported Formats
//!
//! | Format | Import | Export | Notes |
//! |--------|--------|--------|-------|
//! | TSV | ✓ | ✓ | Lossy on embedded tabs/newlines |
//! | CSV | ✓ | ✓ | RFC 4180, always-quoted output |
//! | JSON | ✓ | ✓ | Envelope object or bare record array |
//! | XML | ✓ | ✓ | Attribute rows, comments as child element |
//! | YAML | ✓ | ✓ | Flat document, block sequence of records |
//!
//! # Examples
//!
//! ## Import a progress file
//!
//! ```rust,ignore
//! use codetrack::io::{ImportOptions, ImportService};
//!
//! let report = service.import_from_text(&content, Some("backup.csv"), &ImportOptions::default())?;
//! println!("imported {} records", report.success_count);
//! ```
//!
//! ## Export one list as YAML
//!
//! ```rust,ignore
//! use codetrack::io::{ExportOptions, ExportService, Format};
//!
//! let options = ExportOptions::default()
//!     .with_format(Format::Yaml)
//!     .with_list_id("blind_75");
//! let result = service.export_to_string(&options)?;
//! println!("{}", result.content);
//! ```

pub mod conflict;
pub mod detect;
pub mod fields;
pub mod formats;
pub mod mode;
pub mod services;

// Re-exports for convenience
pub use conflict::{ConflictEntry, FieldChange, compare_records, detect_conflicts};
pub use detect::detect_format;
pub use fields::Field;
pub use formats::{Codec, Format, ParsedBundle, codec_for};
pub use mode::{detect_mode_from_fields, detect_mode_from_headers, filter_by_mode};
pub use services::export::{ExportOptions, ExportResult, ExportService};
pub use services::import::{ImportOptions, ImportReport, ImportService, PendingConflict};
