//! Definition lookup: scanners that find definitions, the tag file they are
//! persisted to, and the in-memory index served to clients.

pub mod cache;
pub mod definitions;
pub mod index;
pub mod tags;

pub use cache::{LoadedSymbols, LookupError, SymbolCache};
pub use definitions::{
    Definition, DefinitionKind, DefinitionScanner, PatternScanner, ScannerRegistry,
};
pub use index::SymbolIndex;
pub use tags::{read_tags, write_tags};
