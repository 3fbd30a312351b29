use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use codenav::llm::LanguageModel;
use codenav::web::create_router;

use crate::helpers::test_utils::{get, post_json};
use crate::helpers::{FakeLlm, TestHarness};

fn sample_repo() -> Result<TestHarness> {
    let harness = TestHarness::new()?;
    harness.create_test_file(
        "src/config_loader.py",
        "def load_config(path):\n    return parse_file(path)\n",
    )?;
    harness.create_test_file("src/server.py", "class Server:\n    def start(self):\n        pass\n")?;
    harness.create_test_file("README.md", "# Demo\n")?;
    harness.create_test_file(".env", "SECRET=1\n")?;
    Ok(harness)
}

#[tokio::test]
async fn test_root_message() -> Result<()> {
    let harness = TestHarness::new()?;
    let (status, body) = get(harness.router(None), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Code Navigator Backend Ready" }));
    Ok(())
}

#[tokio::test]
async fn test_browse_missing_path_is_404() -> Result<()> {
    let harness = TestHarness::new()?;
    let (status, body) = get(harness.router(None), "/browse/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("nonexistent"));
    Ok(())
}

#[tokio::test]
async fn test_browse_root_and_file() -> Result<()> {
    let harness = sample_repo()?;

    let (status, body) = get(harness.router(None), "/browse/").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["src", "README.md"]);
    assert_eq!(body["items"][0]["is_dir"], json!(true));

    let (status, body) = get(harness.router(None), "/browse/src/server.py").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], json!("src/server.py"));
    assert!(body["content"].as_str().unwrap().starts_with("class Server:"));
    assert_eq!(body["truncated"], json!(false));
    Ok(())
}

#[tokio::test]
async fn test_browse_escape_is_forbidden() -> Result<()> {
    let harness = TestHarness::new()?;
    let (status, body) = get(harness.router(None), "/browse/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_config_reports_repo_path() -> Result<()> {
    let harness = TestHarness::new()?;
    let (status, body) = get(harness.router(None), "/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["repo_path"],
        json!(harness.repo_path().display().to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_definition_lookup() -> Result<()> {
    let harness = sample_repo()?;

    // No tag file yet
    let (status, body) = get(harness.router(None), "/index/definition/load_config").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["detail"],
        json!("Ctags index not available. Run indexing first.")
    );

    harness.index().await?;
    let router = harness.router(None);

    let (status, body) = get(router.clone(), "/index/definition/load_config").await;
    assert_eq!(status, StatusCode::OK);
    let defs = body["definitions"].as_array().unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0]["name"], json!("load_config"));
    assert_eq!(defs[0]["file_path"], json!("src/config_loader.py"));
    assert_eq!(defs[0]["line_number"], json!(1));
    assert_eq!(defs[0]["type"], json!("function"));

    let (status, body) = get(router, "/index/definition/missing_symbol").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        json!("Symbol 'missing_symbol' not found in the index")
    );
    Ok(())
}

#[tokio::test]
async fn test_reload_picks_up_new_index() -> Result<()> {
    let harness = sample_repo()?;
    let state = harness.state(None);

    harness.index().await?;
    let (status, body) = post_json(create_router(state.clone()), "/index/reload", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let before = body["symbols"].as_u64().unwrap();
    assert_eq!(before, 3);

    harness.create_test_file("src/extra.py", "def extra():\n    pass\n")?;
    harness.index().await?;
    let (_, body) = post_json(create_router(state), "/index/reload", json!({})).await;
    assert_eq!(body["symbols"].as_u64().unwrap(), before + 1);
    Ok(())
}

#[tokio::test]
async fn test_semantic_search_endpoint() -> Result<()> {
    let harness = sample_repo()?;
    harness.index().await?;

    let (status, body) = post_json(
        harness.router(None),
        "/search",
        json!({ "query": "load config", "limit": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let hits = body.as_array().unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0]["file_path"], json!("src/config_loader.py"));
    assert!(hits[0]["score"].as_f64().unwrap() > 0.0);
    assert!(hits.iter().all(|h| h["file_path"] != json!("README.md")));
    Ok(())
}

#[tokio::test]
async fn test_semantic_search_unavailable() -> Result<()> {
    let harness = TestHarness::new()?;
    let router = create_router(harness.degraded_state());
    let (status, body) = post_json(router, "/search", json!({ "query": "anything" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Search functionality is not available"));
    Ok(())
}

#[tokio::test]
async fn test_scan_search_endpoint() -> Result<()> {
    let harness = sample_repo()?;

    let (status, body) = get(harness.router(None), "/search?q=parse_file&code=true").await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["file_path"], json!("src/config_loader.py"));
    assert!(hits[0]["snippet"].as_str().unwrap().contains("«parse_file»"));

    let (status, body) = get(harness.router(None), "/search?q=server&ext=.py").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["file_path"], json!("src/server.py"));

    let (status, _) = get(harness.router(None), "/search?q=x&dir=..%2Fup").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get(harness.router(None), "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_semantic_search_store_failure_is_unavailable() -> Result<()> {
    let harness = TestHarness::new()?;
    let router = create_router(harness.offline_state());
    let (status, body) = post_json(router, "/search", json!({ "query": "foo" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Search functionality is not available"));
    assert!(detail.contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() -> Result<()> {
    let harness = sample_repo()?;

    let (status, body) = post_json(harness.router(None), "/search", json!({ "q": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = post_json(harness.router(None), "/query", json!({ "prompt": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_query_without_llm_is_unavailable() -> Result<()> {
    let harness = sample_repo()?;
    let (status, body) = post_json(
        harness.router(None),
        "/query",
        json!({ "question": "What does load_config do?" }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_query_with_context_file() -> Result<()> {
    let harness = sample_repo()?;
    harness.index().await?;

    let llm = Arc::new(FakeLlm::replying("It parses the file at `path`."));
    let (status, body) = post_json(
        harness.router(Some(llm.clone() as Arc<dyn LanguageModel>)),
        "/query",
        json!({
            "question": "What does load_config do?",
            "context_file_path": "src/config_loader.py"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "It parses the file at `path`." }));

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("--- Codebase Summary ---"));
    assert!(prompt.contains("--- Relevant Code Snippets ---"));
    assert!(prompt.contains("--- Specific File Context: src/config_loader.py ---"));
    assert!(prompt.contains("User Question: What does load_config do?"));
    Ok(())
}

#[tokio::test]
async fn test_query_llm_failure_is_bad_gateway() -> Result<()> {
    let harness = sample_repo()?;
    harness.index().await?;

    let llm = Arc::new(FakeLlm::failing("quota exceeded"));
    let (status, body) = post_json(
        harness.router(Some(llm as Arc<dyn LanguageModel>)),
        "/query",
        json!({ "question": "Explain the server" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().contains("quota exceeded"));
    Ok(())
}

#[tokio::test]
async fn test_stats_after_indexing() -> Result<()> {
    let harness = sample_repo()?;
    harness.index().await?;
    let state = harness.state(None);
    state.symbols.rebuild()?;

    let (status, body) = get(create_router(state), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chunks"], json!(3));
    assert_eq!(body["symbols"], json!(3));
    assert_eq!(body["manifest"]["files_indexed"], json!(3));
    Ok(())
}

#[tokio::test]
async fn test_health_and_metrics() -> Result<()> {
    codenav::metrics::register_metrics();
    let harness = TestHarness::new()?;

    let (status, body) = get(harness.router(None), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, _) = get(harness.router(None), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
