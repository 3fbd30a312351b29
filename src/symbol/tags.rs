//! Tag file in universal-ctags JSON-lines layout.
//!
//! One object per line: `{"_type":"tag","name":..,"path":..,"line":..,"kind":..}`.
//! Output produced by `ctags --output-format=json --fields=+n` reads back too.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::definitions::{Definition, DefinitionKind};

#[derive(Debug, Serialize, Deserialize)]
struct TagLine {
    #[serde(rename = "_type")]
    entry_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    line: Option<usize>,
    #[serde(default)]
    kind: Option<String>,
}

/// Write `definitions` to `path`, replacing any previous file
pub fn write_tags(path: &Path, definitions: &[Definition]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create tag file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for def in definitions {
        let line = TagLine {
            entry_type: "tag".to_string(),
            name: def.name.clone(),
            path: def.file_path.clone(),
            line: Some(def.line_number),
            kind: Some(def.kind.as_str().to_string()),
        };
        serde_json::to_writer(&mut writer, &line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!(path = %path.display(), count = definitions.len(), "Wrote tag file");
    Ok(())
}

/// Read definitions back from a tag file.
///
/// Pseudo-tags, unknown kinds and entries without a line number are skipped.
pub fn read_tags(path: &Path) -> Result<Vec<Definition>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open tag file {}", path.display()))?;

    let mut definitions = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let tag: TagLine = match serde_json::from_str(&line) {
            Ok(tag) => tag,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed tag line");
                continue;
            }
        };
        if tag.entry_type != "tag" || tag.name.is_empty() {
            continue;
        }

        let (Some(line_number), Some(kind)) = (
            tag.line,
            tag.kind.as_deref().and_then(DefinitionKind::from_ctags),
        ) else {
            continue;
        };

        definitions.push(Definition {
            name: tag.name,
            file_path: tag.path,
            line_number,
            kind,
        });
    }
    Ok(definitions)
}
