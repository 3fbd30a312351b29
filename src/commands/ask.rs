use anyhow::Result;

use super::build_state;
use crate::config::Config;

/// Answer a question with the same orchestrator as `POST /query`
pub async fn run(config: Config, question: &str, file: Option<&str>) -> Result<()> {
    let root = config.repo_root()?;
    let state = build_state(config, root).await;

    let answer = state.orchestrator.answer(question, file).await?;
    println!("{}", answer);
    Ok(())
}
