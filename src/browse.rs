//! Read-only view of the repository tree.

use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{NavError, NavResult};

/// Files larger than this are cut to their first `MAX_DISPLAY_BYTES`
pub const MAX_DISPLAY_BYTES: u64 = 1024 * 1024;

pub const BINARY_PLACEHOLDER: &str = "This appears to be a binary file and cannot be displayed.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    pub items: Vec<DirEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    /// Size on disk in bytes
    pub size: u64,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BrowseEntry {
    Directory(DirectoryListing),
    File(FileContent),
}

/// Resolve a repository-relative path, refusing anything that leaves the root
pub fn resolve_repo_path(root: &Path, relative: &str) -> NavResult<PathBuf> {
    let trimmed = relative.trim_start_matches('/');
    let rel = Path::new(trimmed);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(NavError::Forbidden(format!(
            "Path is outside the repository: {}",
            relative
        )));
    }

    let path = root.join(rel);
    if !path.exists() {
        return Err(NavError::NotFound(format!("Path not found: {}", relative)));
    }

    // Symlinks may still point elsewhere
    let canonical_root = root.canonicalize()?;
    let canonical = path.canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        return Err(NavError::Forbidden(format!(
            "Path is outside the repository: {}",
            relative
        )));
    }
    Ok(path)
}

/// List a directory or read a file below `root`
pub fn browse(root: &Path, relative: &str) -> NavResult<BrowseEntry> {
    let path = resolve_repo_path(root, relative)?;
    let display = relative.trim_matches('/').to_string();

    if path.is_dir() {
        Ok(BrowseEntry::Directory(list_directory(&path, display)?))
    } else if path.is_file() {
        Ok(BrowseEntry::File(read_file(&path, display)?))
    } else {
        Err(NavError::BadRequest(format!(
            "Path is neither a file nor a directory: {}",
            relative
        )))
    }
}

fn list_directory(path: &Path, display: String) -> NavResult<DirectoryListing> {
    let mut items = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        items.push(DirEntry { name, is_dir });
    }
    items.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

    Ok(DirectoryListing {
        path: display,
        items,
    })
}

fn read_file(path: &Path, display: String) -> NavResult<FileContent> {
    let size = std::fs::metadata(path)?.len();
    let truncated = size > MAX_DISPLAY_BYTES;

    let mut bytes = Vec::with_capacity(size.min(MAX_DISPLAY_BYTES) as usize);
    File::open(path)?
        .take(MAX_DISPLAY_BYTES)
        .read_to_end(&mut bytes)?;

    let content = decode_text(&bytes, truncated).unwrap_or_else(|| {
        debug!(path = %path.display(), "Serving binary placeholder");
        BINARY_PLACEHOLDER.to_string()
    });

    Ok(FileContent {
        path: display,
        content,
        size,
        truncated,
    })
}

/// UTF-8 text, or `None` for binary data. A multi-byte sequence cut by
/// truncation is dropped rather than treated as binary.
fn decode_text(bytes: &[u8], truncated: bool) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(e) if truncated && e.error_len().is_none() => {
            Some(String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned())
        }
        Err(_) => None,
    }
}
