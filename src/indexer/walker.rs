use ignore::WalkBuilder;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::IndexerConfig;

/// Enumerates indexable repository files.
///
/// Hidden entries, excluded directory names (matched on any path component),
/// files over the size limit and unknown extensions are skipped. `.gitignore`
/// rules apply when enabled in the config.
pub struct Walker {
    root: PathBuf,
    extensions: HashSet<String>,
    excluded_dirs: HashSet<String>,
    respect_gitignore: bool,
    max_file_size: u64,
}

impl Walker {
    pub fn new(root: PathBuf, config: &IndexerConfig) -> Self {
        Self {
            root,
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            excluded_dirs: config.excluded_dirs.iter().cloned().collect(),
            respect_gitignore: config.respect_gitignore,
            max_file_size: config.max_file_size,
        }
    }

    /// Walk the tree and yield absolute file paths
    pub fn walk(&self) -> impl Iterator<Item = PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .parents(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false);

        let excluded = self.excluded_dirs.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            !(is_dir
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| excluded.contains(name))
                    .unwrap_or(false))
        });

        let extensions = self.extensions.clone();
        let max_file_size = self.max_file_size;

        builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(move |entry| has_extension(entry.path(), &extensions))
            .filter(move |entry| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if size > max_file_size {
                    debug!(path = %entry.path().display(), size, "Skipping large file");
                    return false;
                }
                true
            })
            .map(|entry| entry.into_path())
    }

    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.walk().collect();
        files.sort();
        files
    }
}

fn has_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

/// Repository-relative path with `/` separators, as stored in chunks and tags
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
