use anyhow::Result;

use super::open_search_backend;
use crate::config::Config;
use crate::search::{Ranker, Search, SearchHit, SemanticSearch};

/// Semantic search from the terminal, ranked like `POST /search`
pub async fn run(config: Config, query: &str, limit: Option<usize>) -> Result<()> {
    let (embedder, store) = open_search_backend(&config).await?;
    let ranker = Ranker::from_config(&config.search);
    let limit = limit.unwrap_or(ranker.max_results()).max(1);

    let search = SemanticSearch::new(store, embedder, ranker, config.search.candidates);
    let hits = search.search(query, limit).await?;

    if hits.is_empty() {
        println!("No results found for: {}", query);
        println!("\nMake sure you have indexed the repository with 'codenav index'");
        return Ok(());
    }

    println!("Found {} results for: \"{}\"\n", hits.len(), query);
    for (i, hit) in hits.iter().enumerate() {
        print_hit(i + 1, hit);
    }

    Ok(())
}

fn print_hit(rank: usize, hit: &SearchHit) {
    let score_pct = (hit.score * 100.0).round() as i32;
    let marker = if hit.exact_match { " [exact]" } else { "" };
    println!(
        "{}. {}:{}-{} (score: {}%){}",
        rank, hit.file_path, hit.start_char, hit.end_char, score_pct, marker
    );
    println!("{}", format_preview(&hit.snippet, 5));
    println!();
}

/// First `max_lines` lines, indented
fn format_preview(content: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut preview: Vec<String> = lines
        .iter()
        .take(max_lines)
        .map(|line| format!("   {}", line))
        .collect();
    if lines.len() > max_lines {
        preview.push("   ...".to_string());
    }
    preview.join("\n")
}
