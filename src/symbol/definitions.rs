//! Regex-driven definition scanning, keyed by file extension.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// What a definition entry names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Class,
    Method,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Method => "method",
        }
    }

    /// Map a ctags kind (long or single-letter form) onto our kinds
    pub fn from_ctags(kind: &str) -> Option<Self> {
        match kind {
            "function" | "f" | "func" => Some(Self::Function),
            "class" | "c" | "struct" | "s" | "interface" | "i" | "trait" | "enum" | "g" => {
                Some(Self::Class)
            }
            "method" | "m" | "member" => Some(Self::Method),
            _ => None,
        }
    }
}

/// One definition site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub file_path: String,
    /// 1-based
    pub line_number: usize,
    #[serde(rename = "type")]
    pub kind: DefinitionKind,
}

/// Finds definitions in the files of the languages it supports
pub trait DefinitionScanner: Send + Sync {
    /// Lowercase extensions without the dot
    fn extensions(&self) -> &[&'static str];

    fn scan(&self, file_path: &str, content: &str) -> Vec<Definition>;
}

/// Scanner driven by an ordered table of `(regex, kind)` rules.
///
/// Every rule is applied to every line; capture group 1 is the name.
pub struct PatternScanner {
    extensions: Vec<&'static str>,
    rules: Vec<(Regex, DefinitionKind)>,
}

impl PatternScanner {
    pub fn new(
        extensions: &[&'static str],
        rules: &[(&str, DefinitionKind)],
    ) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(pattern, kind)| Ok((Regex::new(pattern)?, *kind)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            extensions: extensions.to_vec(),
            rules,
        })
    }

    pub fn python() -> Result<Self, regex::Error> {
        Self::new(
            &["py"],
            &[
                (r"^(?:async\s+)?def\s+([A-Za-z0-9_]+)\s*\(", DefinitionKind::Function),
                (r"^\s+(?:async\s+)?def\s+([A-Za-z0-9_]+)\s*\(", DefinitionKind::Method),
                (r"^\s*class\s+([A-Za-z0-9_]+)\s*[:\(]", DefinitionKind::Class),
            ],
        )
    }

    pub fn javascript() -> Result<Self, regex::Error> {
        Self::new(
            &["js", "jsx", "ts", "tsx"],
            &[
                (r"function\s+([A-Za-z0-9_$]+)\s*\(", DefinitionKind::Function),
                (r"class\s+([A-Za-z0-9_$]+)[\s{]", DefinitionKind::Class),
                (
                    r"const\s+([A-Za-z0-9_$]+)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>",
                    DefinitionKind::Function,
                ),
            ],
        )
    }

    pub fn rust() -> Result<Self, regex::Error> {
        Self::new(
            &["rs"],
            &[
                (
                    r"^(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z0-9_]+)",
                    DefinitionKind::Function,
                ),
                (
                    r"^\s+(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z0-9_]+)",
                    DefinitionKind::Method,
                ),
                (
                    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+([A-Za-z0-9_]+)",
                    DefinitionKind::Class,
                ),
            ],
        )
    }

    pub fn go() -> Result<Self, regex::Error> {
        Self::new(
            &["go"],
            &[
                (r"^func\s+([A-Za-z0-9_]+)\s*[\[(]", DefinitionKind::Function),
                (r"^func\s+\([^)]*\)\s*([A-Za-z0-9_]+)\s*\(", DefinitionKind::Method),
                (r"^type\s+([A-Za-z0-9_]+)\s+(?:struct|interface)\b", DefinitionKind::Class),
            ],
        )
    }
}

impl DefinitionScanner for PatternScanner {
    fn extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    fn scan(&self, file_path: &str, content: &str) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for (index, line) in content.lines().enumerate() {
            for (regex, kind) in &self.rules {
                for captures in regex.captures_iter(line) {
                    if let Some(name) = captures.get(1) {
                        definitions.push(Definition {
                            name: name.as_str().to_string(),
                            file_path: file_path.to_string(),
                            line_number: index + 1,
                            kind: *kind,
                        });
                    }
                }
            }
        }
        definitions
    }
}

/// Extension → scanner table
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    scanners: HashMap<String, Arc<dyn DefinitionScanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Python, JavaScript/TypeScript, Rust and Go scanners
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for scanner in [
            PatternScanner::python(),
            PatternScanner::javascript(),
            PatternScanner::rust(),
            PatternScanner::go(),
        ] {
            registry.register(Arc::new(
                scanner.expect("built-in definition patterns are valid"),
            ));
        }
        registry
    }

    /// Route every extension of `scanner` to it, replacing earlier registrations
    pub fn register(&mut self, scanner: Arc<dyn DefinitionScanner>) {
        for ext in scanner.extensions() {
            self.scanners.insert(ext.to_string(), scanner.clone());
        }
    }

    pub fn scanner_for(&self, path: &Path) -> Option<&Arc<dyn DefinitionScanner>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.scanners.get(&ext)
    }

    /// Scan `content` with the scanner registered for the extension of `file_path`
    pub fn scan(&self, file_path: &str, content: &str) -> Vec<Definition> {
        self.scanner_for(Path::new(file_path))
            .map(|scanner| scanner.scan(file_path, content))
            .unwrap_or_default()
    }
}
