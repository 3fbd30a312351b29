use anyhow::Result;
use std::sync::Arc;

use codenav::indexing::IndexManifest;
use codenav::search::{Ranker, Search, SemanticSearch};
use codenav::symbol::{DefinitionKind, LookupError, SymbolCache};

use crate::helpers::TestHarness;

#[tokio::test]
async fn test_single_function_file() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.create_test_file("app.py", "def foo(): pass\n")?;

    let report = harness.index().await?;
    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.chunks_stored, 1);

    let cache = SymbolCache::new(harness.config.tags_path(), 1000);
    let defs = cache.lookup("foo")?;
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].kind, DefinitionKind::Function);
    assert_eq!(defs[0].line_number, 1);
    assert_eq!(defs[0].file_path, "app.py");

    assert_eq!(
        cache.lookup("bar"),
        Err(LookupError::NotFound("bar".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn test_index_then_semantic_search() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.create_test_file(
        "auth/login.py",
        "def login(user, password):\n    return check_password(user, password)\n",
    )?;
    harness.create_test_file("math_utils.py", "def add(a, b):\n    return a + b\n")?;
    harness.create_test_file("node_modules/dep/index.js", "function password() {}\n")?;

    let report = harness.index().await?;
    assert_eq!(report.files_indexed, 2);

    let search = SemanticSearch::new(
        harness.store.clone(),
        harness.embedder.clone(),
        Ranker::from_config(&harness.config.search),
        harness.config.search.candidates,
    );
    let hits = search.search("password", 10).await?;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_path, "auth/login.py");
    assert!(hits[0].snippet.contains("check_password"));
    assert!(hits[0].score > 0.0);
    Ok(())
}

#[tokio::test]
async fn test_long_file_is_chunked_with_overlap() -> Result<()> {
    let mut harness = TestHarness::new()?;
    harness.config.indexer.chunk_size = 100;
    harness.config.indexer.chunk_overlap = 20;

    let body: String = (0..25).map(|i| format!("x{:02} = {}\n", i, i)).collect();
    assert!(body.chars().count() > 200);
    harness.create_test_file("values.py", &body)?;

    let report = harness.index().await?;
    assert!(report.chunks_stored >= 3);

    let manifest = IndexManifest::load(&harness.config.manifest_path())?.unwrap();
    assert_eq!(manifest.chunks, report.chunks_stored);
    assert_eq!(manifest.files_indexed, 1);
    Ok(())
}

#[tokio::test]
async fn test_definitions_across_languages() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.create_test_file(
        "src/lib.rs",
        "pub struct Walker;\n\nimpl Walker {\n    pub fn walk(&self) {}\n}\n",
    )?;
    harness.create_test_file(
        "models.py",
        "class User:\n    def save(self):\n        pass\n",
    )?;

    harness.index().await?;

    let cache = Arc::new(SymbolCache::new(harness.config.tags_path(), 1000));
    assert_eq!(cache.lookup("Walker")?[0].kind, DefinitionKind::Class);
    assert_eq!(cache.lookup("walk")?[0].kind, DefinitionKind::Method);
    assert_eq!(cache.lookup("User")?[0].kind, DefinitionKind::Class);

    let save = &cache.lookup("save")?[0];
    assert_eq!(save.kind, DefinitionKind::Method);
    assert_eq!(save.line_number, 2);

    let summary = cache.summary();
    assert!(summary.contains("File: models.py"));
    assert!(summary.contains("class User (line 1)"));
    Ok(())
}
