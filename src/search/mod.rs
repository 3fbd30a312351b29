//! Search over the repository.
//!
//! - `ranker` - blended scoring and snippet windows shared by every search form
//! - `semantic` - embedding search against the vector store
//! - `scan` - direct filename/content scan of the repository tree

pub mod ranker;
pub mod scan;
pub mod semantic;
pub mod traits;

pub use ranker::{Ranker, SearchHit, SnippetWindow};
pub use scan::{RepoScanner, ScanRequest};
pub use semantic::SemanticSearch;
pub use traits::{Retriever, Search};
