//! Offline indexing job

pub mod errors;
pub mod parallel;
pub mod pipeline;

pub use errors::{ErrorCollector, ErrorReport, FileError, ProcessingStage};
pub use parallel::ParallelIndexer;
pub use pipeline::{FileContent, IndexManifest, IndexReport, ProcessedFile};
