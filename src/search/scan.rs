//! Direct scan of the repository tree, by file name or file content.

use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::ranker::{find_char, fold_case, match_terms, query_terms, Ranker, SearchHit, SnippetWindow};
use crate::config::IndexerConfig;
use crate::error::{NavError, NavResult};
use crate::indexer::{relative_path, Walker};
use crate::metrics::{SEARCH_LATENCY, SEARCH_REQUESTS, SEARCH_RESULTS};

const SEARCH_TYPE: &str = "scan";

#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub query: String,
    /// Extension filter, leading dot optional
    pub ext: Option<String>,
    /// Repository-relative directory to restrict the scan to
    pub dir: Option<String>,
    /// Search file contents instead of file names
    pub content: bool,
    /// Case-sensitive literal match
    pub exact: bool,
}

/// Strip one pair of matching surrounding quotes; quoted queries are exact
fn unquote(query: &str) -> (&str, bool) {
    let trimmed = query.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return (&trimmed[1..trimmed.len() - 1], true);
        }
    }
    (trimmed, false)
}

enum Matcher {
    Exact(String),
    Terms { terms: Vec<String>, phrase: String },
}

struct FileMatch {
    score: f32,
    first: Option<(usize, usize)>,
    exact: bool,
}

impl Matcher {
    fn matches(&self, text: &str) -> Option<FileMatch> {
        match self {
            Matcher::Exact(needle) => find_char(text, needle).map(|pos| FileMatch {
                score: 1.0,
                first: Some((pos, needle.chars().count())),
                exact: true,
            }),
            Matcher::Terms { terms, phrase } => {
                let folded = fold_case(text);
                let matched = match_terms(&folded, terms);
                matched.first.map(|_| FileMatch {
                    score: matched.score,
                    first: matched.first,
                    exact: folded.contains(phrase.as_str()),
                })
            }
        }
    }
}

/// Walks the repository and matches names or contents against a query
pub struct RepoScanner {
    root: PathBuf,
    indexer: IndexerConfig,
    ranker: Ranker,
    scan_limit: usize,
}

impl RepoScanner {
    pub fn new(root: PathBuf, indexer: IndexerConfig, ranker: Ranker, scan_limit: usize) -> Self {
        Self {
            root,
            indexer,
            ranker,
            scan_limit,
        }
    }

    fn resolve_dir(&self, dir: Option<&str>) -> NavResult<PathBuf> {
        let Some(dir) = dir.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(self.root.clone());
        };
        let relative = Path::new(dir.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(NavError::Forbidden(format!(
                "Directory is outside the repository: {}",
                dir
            )));
        }
        let path = self.root.join(relative);
        if !path.is_dir() {
            return Err(NavError::NotFound(format!("Directory not found: {}", dir)));
        }
        Ok(path)
    }

    /// Run a scan; blocking, so call it from `spawn_blocking` inside async code
    pub fn scan(&self, request: &ScanRequest) -> NavResult<Vec<SearchHit>> {
        let (query, quoted) = unquote(&request.query);
        if query.trim().is_empty() {
            return Err(NavError::BadRequest("Query must not be empty".to_string()));
        }
        let exact = request.exact || quoted;

        SEARCH_REQUESTS.with_label_values(&[SEARCH_TYPE]).inc();
        let start = Instant::now();

        let matcher = if exact {
            Matcher::Exact(query.to_string())
        } else {
            Matcher::Terms {
                terms: query_terms(query),
                phrase: fold_case(query.trim()),
            }
        };
        let ext_filter = request
            .ext
            .as_deref()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty());

        let walker = Walker::new(self.resolve_dir(request.dir.as_deref())?, &self.indexer);
        let mut hits = Vec::new();

        for path in walker.walk() {
            if hits.len() >= self.scan_limit {
                debug!(limit = self.scan_limit, "Scan limit reached");
                break;
            }
            if let Some(ext) = &ext_filter {
                let file_ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_lowercase);
                if file_ext.as_deref() != Some(ext.as_str()) {
                    continue;
                }
            }

            let rel = relative_path(&self.root, &path);
            let hit = if request.content {
                self.match_content(&path, rel, &matcher)
            } else {
                self.match_name(&path, rel, &matcher)
            };
            hits.extend(hit);
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.ranker.max_results());

        let elapsed = start.elapsed();
        SEARCH_LATENCY
            .with_label_values(&[SEARCH_TYPE])
            .observe(elapsed.as_secs_f64());
        SEARCH_RESULTS.observe(hits.len() as f64);

        info!(
            search_type = SEARCH_TYPE,
            query = query,
            content = request.content,
            exact,
            results = hits.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Scan completed"
        );

        Ok(hits)
    }

    fn match_name(&self, path: &Path, rel: String, matcher: &Matcher) -> Option<SearchHit> {
        let name = path.file_name()?.to_string_lossy();
        let found = matcher.matches(&name)?;
        Some(SearchHit {
            snippet: rel.clone(),
            file_path: rel,
            score: found.score,
            start_char: 0,
            end_char: 0,
            exact_match: found.exact,
        })
    }

    fn match_content(&self, path: &Path, rel: String, matcher: &Matcher) -> Option<SearchHit> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable file");
                return None;
            }
        };
        let found = matcher.matches(&text)?;
        let (pos, len) = found.first?;

        let doc_len = text.chars().count();
        let window = if doc_len > 0 {
            self.ranker.window(doc_len, pos, len)
        } else {
            SnippetWindow::whole(0)
        };

        Some(SearchHit {
            file_path: rel,
            snippet: window.render(&text, Some((pos, pos + len))),
            score: found.score,
            start_char: window.start,
            end_char: window.end,
            exact_match: found.exact,
        })
    }
}
