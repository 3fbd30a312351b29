use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IndexerConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk_size must be greater than zero")]
    ZeroSize,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },

    #[error("invalid chunk range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("chunk text is empty")]
    EmptyText,
}

/// A window of a source file, addressed by character offsets.
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    /// Repository-relative path with `/` separators
    pub file_path: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
}

impl Chunk {
    /// Build a chunk from stored fields, checking its range and text.
    pub fn try_new(
        file_path: impl Into<String>,
        text: impl Into<String>,
        start_char: usize,
        end_char: usize,
    ) -> Result<Self, ChunkerError> {
        if start_char >= end_char {
            return Err(ChunkerError::InvalidRange {
                start: start_char,
                end: end_char,
            });
        }
        let text = text.into();
        if text.is_empty() {
            return Err(ChunkerError::EmptyText);
        }
        let file_path = file_path.into();
        Ok(Self {
            id: chunk_id(&file_path, start_char, end_char),
            file_path,
            text,
            start_char,
            end_char,
        })
    }

    /// Number of characters covered by the chunk
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

/// Deterministic id shared by every run over the same input
pub fn chunk_id(file_path: &str, start_char: usize, end_char: usize) -> String {
    format!("{}:{}-{}", file_path, start_char, end_char)
}

/// Splits file text into fixed-size overlapping character windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkerError> {
        if chunk_size == 0 {
            return Err(ChunkerError::ZeroSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self, ChunkerError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Lazily iterate over the windows of `text`.
    ///
    /// Whitespace-only windows are skipped. Iteration ends with the first
    /// window that reaches the end of the text.
    pub fn chunks<'a>(&self, file_path: &'a str, text: &'a str) -> Chunks<'a> {
        Chunks {
            file_path,
            text,
            size: self.chunk_size,
            stride: self.stride(),
            start_char: 0,
            start_byte: 0,
            finished: text.is_empty(),
        }
    }
}

/// Iterator returned by [`Chunker::chunks`]; clone it to restart from the same point.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    file_path: &'a str,
    text: &'a str,
    size: usize,
    stride: usize,
    start_char: usize,
    start_byte: usize,
    finished: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        while !self.finished {
            let rest = &self.text[self.start_byte..];
            let (window_bytes, window_chars) = advance(rest, self.size);
            let window = &rest[..window_bytes];
            let start = self.start_char;

            if window_bytes == rest.len() {
                self.finished = true;
            } else {
                let (stride_bytes, stride_chars) = advance(rest, self.stride);
                self.start_byte += stride_bytes;
                self.start_char += stride_chars;
            }

            if window.trim().is_empty() {
                continue;
            }

            let end = start + window_chars;
            return Some(Chunk {
                id: chunk_id(self.file_path, start, end),
                file_path: self.file_path.to_string(),
                text: window.to_string(),
                start_char: start,
                end_char: end,
            });
        }
        None
    }
}

/// Byte and char length of the first `n` chars of `s` (or all of it)
fn advance(s: &str, n: usize) -> (usize, usize) {
    match s.char_indices().nth(n) {
        Some((byte, _)) => (byte, n),
        None => (s.len(), s.chars().count()),
    }
}
