//! Storage layer.
//!
//! One synchronous trait, [`ProgressStore`], is the seam between the
//! import/export services and whatever holds the data. The bundled
//! backend is [`MemoryStore`], an in-memory store with JSON snapshot
//! persistence for the CLI.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::ProgressStore;
