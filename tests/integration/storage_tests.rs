use anyhow::Result;
use tempfile::TempDir;

use codenav::indexer::Chunk;
use codenav::storage::{cosine_distance, EmbeddingRecord, LanceStore, MemoryStore, VectorStore};

fn record(path: &str, text: &str, start: usize, vector: Vec<f32>) -> EmbeddingRecord {
    let end = start + text.chars().count();
    EmbeddingRecord {
        chunk: Chunk::try_new(path, text, start, end).unwrap(),
        vector,
    }
}

fn sample_records() -> Vec<EmbeddingRecord> {
    vec![
        record("a.py", "def alpha(): pass", 0, vec![1.0, 0.0, 0.0, 0.0]),
        record("b.py", "def beta(): pass", 0, vec![0.0, 1.0, 0.0, 0.0]),
        record("c.py", "def gamma(): pass", 0, vec![0.7, 0.7, 0.0, 0.0]),
    ]
}

async fn exercise_store(store: &dyn VectorStore) -> Result<()> {
    store.rebuild().await?;
    assert_eq!(store.count().await?, 0);
    assert!(store.query(&[1.0, 0.0, 0.0, 0.0], 3).await?.is_empty());

    store.upsert(sample_records()).await?;
    assert_eq!(store.count().await?, 3);

    let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 2).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.file_path, "a.py");
    assert_eq!(hits[1].chunk.file_path, "c.py");
    assert!(hits[0].distance <= hits[1].distance);
    assert!(hits[0].distance < 0.01);

    // Same id replaces the stored text
    store
        .upsert(vec![record("a.py", "def omega(): pass", 0, vec![1.0, 0.0, 0.0, 0.0])])
        .await?;
    assert_eq!(store.count().await?, 3);
    let hits = store.query(&[1.0, 0.0, 0.0, 0.0], 1).await?;
    assert_eq!(hits[0].chunk.text, "def omega(): pass");

    store.rebuild().await?;
    assert_eq!(store.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_memory_store_contract() -> Result<()> {
    let store = MemoryStore::new();
    exercise_store(&store).await
}

#[tokio::test]
async fn test_lance_store_contract() -> Result<()> {
    let dir = TempDir::new()?;
    let store = LanceStore::open(&dir.path().join("db"), 4).await?;
    exercise_store(&store).await
}

#[tokio::test]
async fn test_lance_store_persists_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db");
    {
        let store = LanceStore::open(&path, 4).await?;
        store.rebuild().await?;
        store.upsert(sample_records()).await?;
    }

    let reopened = LanceStore::open(&path, 4).await?;
    assert_eq!(reopened.count().await?, 3);
    let hits = reopened.query(&[0.0, 1.0, 0.0, 0.0], 1).await?;
    assert_eq!(hits[0].chunk.file_path, "b.py");
    assert_eq!(hits[0].chunk.start_char, 0);
    assert_eq!(hits[0].chunk.end_char, "def beta(): pass".len());
    Ok(())
}

#[tokio::test]
async fn test_lance_store_rejects_wrong_dimension() -> Result<()> {
    let dir = TempDir::new()?;
    let store = LanceStore::open(&dir.path().join("db"), 4).await?;
    store.rebuild().await?;

    let result = store
        .upsert(vec![record("a.py", "x = 1", 0, vec![1.0, 0.0])])
        .await;
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_cosine_distance_bounds() {
    assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
}
