use anyhow::Result;

use crate::config::Config;
use crate::symbol::SymbolCache;

/// Print every definition of `symbol` from the tag file
pub async fn run(config: Config, symbol: &str) -> Result<()> {
    let cache = SymbolCache::new(config.tags_path(), config.llm.summary_max_chars);
    let name = symbol.to_string();
    let definitions = tokio::task::spawn_blocking(move || cache.lookup(&name)).await??;

    for def in definitions {
        println!(
            "{}:{}  {} {}",
            def.file_path,
            def.line_number,
            def.kind.as_str(),
            def.name
        );
    }
    Ok(())
}
