//! In-memory definition index

use std::collections::{BTreeMap, HashMap};

use super::definitions::Definition;

const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Symbol name to definition sites, in discovery order
#[derive(Debug, Default)]
pub struct SymbolIndex {
    by_name: HashMap<String, Vec<Definition>>,
    /// Sorted by path so summaries are stable
    by_file: BTreeMap<String, Vec<Definition>>,
    symbol_count: usize,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = Definition>) -> Self {
        let mut index = Self::new();
        for def in definitions {
            index.add(def);
        }
        index
    }

    pub fn add(&mut self, definition: Definition) {
        self.by_file
            .entry(definition.file_path.clone())
            .or_default()
            .push(definition.clone());
        self.by_name
            .entry(definition.name.clone())
            .or_default()
            .push(definition);
        self.symbol_count += 1;
    }

    /// Every definition of `name`; empty when unknown
    pub fn lookup(&self, name: &str) -> &[Definition] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn definitions_in_file(&self, file_path: &str) -> &[Definition] {
        self.by_file.get(file_path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    /// Per-file outline of the indexed definitions, cut at `max_chars`.
    ///
    /// ```text
    /// File: src/app.py
    ///   - function run (line 12)
    /// ```
    pub fn summary(&self, max_chars: usize) -> String {
        let mut summary = String::new();
        for (file, defs) in &self.by_file {
            summary.push_str(&format!("File: {}\n", file));
            for def in defs {
                summary.push_str(&format!(
                    "  - {} {} (line {})\n",
                    def.kind.as_str(),
                    def.name,
                    def.line_number
                ));
            }
        }

        if summary.chars().count() > max_chars {
            let mut truncated: String = summary.chars().take(max_chars).collect();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        } else {
            summary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::DefinitionKind;

    fn def(name: &str, file: &str, line: usize, kind: DefinitionKind) -> Definition {
        Definition {
            name: name.to_string(),
            file_path: file.to_string(),
            line_number: line,
            kind,
        }
    }

    #[test]
    fn test_lookup_keeps_discovery_order() {
        let index = SymbolIndex::from_definitions(vec![
            def("run", "b.py", 4, DefinitionKind::Function),
            def("App", "a.py", 1, DefinitionKind::Class),
            def("run", "a.py", 9, DefinitionKind::Method),
        ]);

        let runs = index.lookup("run");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].file_path, "b.py");
        assert_eq!(runs[1].file_path, "a.py");
        assert!(index.lookup("missing").is_empty());
        assert_eq!(index.symbol_count(), 3);
        assert_eq!(index.name_count(), 2);
        assert_eq!(index.file_count(), 2);
        assert_eq!(index.definitions_in_file("a.py").len(), 2);
    }

    #[test]
    fn test_summary_lists_files_in_order() {
        let index = SymbolIndex::from_definitions(vec![
            def("run", "b.py", 4, DefinitionKind::Function),
            def("App", "a.py", 1, DefinitionKind::Class),
        ]);

        let summary = index.summary(10_000);
        assert_eq!(
            summary,
            "File: a.py\n  - class App (line 1)\nFile: b.py\n  - function run (line 4)\n"
        );
    }

    #[test]
    fn test_summary_truncates() {
        let defs = (0..100).map(|i| def(&format!("f{}", i), "big.py", i + 1, DefinitionKind::Function));
        let index = SymbolIndex::from_definitions(defs);

        let summary = index.summary(50);
        assert!(summary.ends_with("... (truncated)"));
        assert_eq!(summary.chars().count(), 50 + TRUNCATION_MARKER.chars().count());
    }
}
