//! Blended semantic/keyword ranking and snippet extraction.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::storage::ScoredChunk;

const ELLIPSIS: &str = "...";
const HIGHLIGHT_OPEN: char = '«';
const HIGHLIGHT_CLOSE: char = '»';

/// One ranked result, shared by semantic search and the repository scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file_path: String,
    pub snippet: String,
    pub score: f32,
    /// Character offsets of the snippet window within the file
    pub start_char: usize,
    pub end_char: usize,
    /// The whole query occurs in the matched text
    pub exact_match: bool,
}

/// Character range `[start, end)` of a document shown as a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetWindow {
    pub start: usize,
    pub end: usize,
    pub doc_len: usize,
}

impl SnippetWindow {
    pub fn whole(doc_len: usize) -> Self {
        Self {
            start: 0,
            end: doc_len,
            doc_len,
        }
    }

    /// Render the window, marking cut sides with `...` and optionally
    /// wrapping the character range `highlight` in `«` `»`
    pub fn render(&self, doc: &str, highlight: Option<(usize, usize)>) -> String {
        let mut out = String::new();
        if self.start > 0 {
            out.push_str(ELLIPSIS);
        }
        for (pos, c) in doc
            .chars()
            .enumerate()
            .skip(self.start)
            .take(self.end - self.start)
        {
            if let Some((h_start, h_end)) = highlight {
                if pos == h_start.max(self.start) && h_start < h_end {
                    out.push(HIGHLIGHT_OPEN);
                }
                out.push(c);
                if pos + 1 == h_end.min(self.end) && h_start < h_end {
                    out.push(HIGHLIGHT_CLOSE);
                }
            } else {
                out.push(c);
            }
        }
        if self.end < self.doc_len {
            out.push_str(ELLIPSIS);
        }
        out
    }
}

/// Lowercase one char at a time so character offsets survive folding
pub fn fold_case(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Distinct lowercase whitespace-separated terms, in query order
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in fold_case(query).split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// Char position of the first occurrence of `needle` in `haystack`
pub fn find_char(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

/// Keyword overlap of already folded text against query terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermMatch {
    /// Fraction of terms present, in `[0, 1]`
    pub score: f32,
    /// Earliest match as `(char position, char length)`
    pub first: Option<(usize, usize)>,
}

pub fn match_terms(folded: &str, terms: &[String]) -> TermMatch {
    if terms.is_empty() {
        return TermMatch {
            score: 0.0,
            first: None,
        };
    }

    let mut matched = 0usize;
    let mut first: Option<(usize, usize)> = None;
    for term in terms {
        if let Some(pos) = find_char(folded, term) {
            matched += 1;
            if first.map_or(true, |(p, _)| pos < p) {
                first = Some((pos, term.chars().count()));
            }
        }
    }

    TermMatch {
        score: matched as f32 / terms.len() as f32,
        first,
    }
}

/// Scores retrieved chunks and cuts snippets around the first match
#[derive(Debug, Clone)]
pub struct Ranker {
    semantic_weight: f32,
    keyword_weight: f32,
    max_results: usize,
    snippet_threshold: usize,
    snippet_before: usize,
    snippet_after: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl Ranker {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            semantic_weight: config.semantic_weight,
            keyword_weight: config.keyword_weight,
            max_results: config.max_results,
            snippet_threshold: config.snippet_threshold,
            snippet_before: config.snippet_before,
            snippet_after: config.snippet_after,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn combined_score(&self, distance: f32, keyword_score: f32) -> f32 {
        let semantic = 1.0 - distance.clamp(0.0, 2.0);
        self.semantic_weight * semantic + self.keyword_weight * keyword_score
    }

    /// Window around a match at char `pos` of length `len`; always covers the match
    pub fn window(&self, doc_len: usize, pos: usize, len: usize) -> SnippetWindow {
        let start = pos.saturating_sub(self.snippet_before);
        let end = (pos + self.snippet_after).max(pos + len).min(doc_len);
        SnippetWindow {
            start,
            end,
            doc_len,
        }
    }

    /// Whole document when short, otherwise a window around the first match
    pub fn window_for(&self, doc_len: usize, first: Option<(usize, usize)>) -> SnippetWindow {
        match first {
            Some((pos, len)) if doc_len > self.snippet_threshold => self.window(doc_len, pos, len),
            _ => SnippetWindow::whole(doc_len),
        }
    }

    /// Rank candidates given in retrieval order.
    ///
    /// Candidates sharing no term with the query are dropped; ties keep
    /// retrieval order.
    pub fn rank(&self, query: &str, candidates: Vec<ScoredChunk>) -> Vec<SearchHit> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }
        let phrase = fold_case(query.trim());

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let chunk = candidate.chunk;
                let folded = fold_case(&chunk.text);
                let matched = match_terms(&folded, &terms);
                if matched.first.is_none() {
                    return None;
                }

                let doc_len = folded.chars().count();
                let window = self.window_for(doc_len, matched.first);
                let snippet = if window == SnippetWindow::whole(doc_len) {
                    chunk.text.clone()
                } else {
                    window.render(&chunk.text, None)
                };

                Some(SearchHit {
                    file_path: chunk.file_path,
                    snippet,
                    score: self.combined_score(candidate.distance, matched.score),
                    start_char: chunk.start_char + window.start,
                    end_char: chunk.start_char + window.end,
                    exact_match: folded.contains(&phrase),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.max_results);
        hits
    }
}
