pub mod chunker;
pub mod walker;

pub use chunker::{chunk_id, Chunk, Chunker, ChunkerError, Chunks};
pub use walker::{relative_path, Walker};
