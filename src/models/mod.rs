//! Data models for codetrack.
//!
//! Store-side records (problems, progress, lists) and the wire-side bundle
//! types the codecs read and write.

mod bundle;
mod problem;

pub use bundle::{BUNDLE_VERSION, BundleRecord, ConflictStrategy, ExportBundle, Mode};
pub use problem::{
    Difficulty, ListMeta, ProblemId, ProblemRecord, ProgressRecord, display_name_from_id,
};
