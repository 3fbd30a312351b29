use anyhow::{Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{EmbeddingRecord, ScoredChunk, VectorStore};
use crate::indexer::Chunk;

const TABLE_NAME: &str = "code_embeddings";

/// LanceDB-backed vector store queried with cosine distance
pub struct LanceStore {
    db: Connection,
    dimension: usize,
}

impl LanceStore {
    /// Open (or create) the database directory at `path`
    pub async fn open(path: &Path, dimension: usize) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create database directory {}", path.display()))?;
        let path_str = path.to_string_lossy();

        info!(path = %path_str, dimension, "Opening LanceDB");

        let db = connect(&path_str)
            .execute()
            .await
            .with_context(|| format!("Failed to connect to LanceDB at {}", path_str))?;

        Ok(Self {
            db,
            dimension,
        })
    }

    async fn table_exists(&self) -> Result<bool> {
        let names = self.db.table_names().execute().await?;
        Ok(names.iter().any(|n| n == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<Option<Table>> {
        if !self.table_exists().await? {
            return Ok(None);
        }
        let table = self
            .db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .with_context(|| format!("Failed to open table {}", TABLE_NAME))?;
        Ok(Some(table))
    }

    async fn get_or_create_table(&self) -> Result<Table> {
        match self.open_table().await? {
            Some(table) => Ok(table),
            None => self.create_table().await,
        }
    }

    async fn create_table(&self) -> Result<Table> {
        debug!(table = TABLE_NAME, "Creating table");
        let schema = Arc::new(self.table_schema());
        let batches = RecordBatchIterator::new(vec![], schema);

        self.db
            .create_table(TABLE_NAME, Box::new(batches))
            .execute()
            .await
            .with_context(|| format!("Failed to create table {}", TABLE_NAME))
    }

    fn table_schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("file_path", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("start_char", DataType::Int64, false),
            Field::new("end_char", DataType::Int64, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
        ])
    }

    fn records_to_batch(&self, records: &[EmbeddingRecord]) -> Result<RecordBatch> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.dimension) {
            anyhow::bail!(
                "Vector for chunk {} has dimension {}, expected {}",
                bad.chunk.id,
                bad.vector.len(),
                self.dimension
            );
        }

        let ids: Vec<&str> = records.iter().map(|r| r.chunk.id.as_str()).collect();
        let paths: Vec<&str> = records.iter().map(|r| r.chunk.file_path.as_str()).collect();
        let texts: Vec<&str> = records.iter().map(|r| r.chunk.text.as_str()).collect();
        let starts: Vec<i64> = records.iter().map(|r| r.chunk.start_char as i64).collect();
        let ends: Vec<i64> = records.iter().map(|r| r.chunk.end_char as i64).collect();

        let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            records
                .iter()
                .map(|r| Some(r.vector.iter().map(|&v| Some(v)))),
            self.dimension as i32,
        );

        RecordBatch::try_new(
            Arc::new(self.table_schema()),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(paths)),
                Arc::new(StringArray::from(texts)),
                Arc::new(Int64Array::from(starts)),
                Arc::new(Int64Array::from(ends)),
                Arc::new(vectors),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    fn batch_to_scored(batch: &RecordBatch, out: &mut Vec<ScoredChunk>) -> Result<()> {
        let paths = string_column(batch, "file_path")?;
        let texts = string_column(batch, "text")?;
        let starts = int64_column(batch, "start_char")?;
        let ends = int64_column(batch, "end_char")?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| anyhow::anyhow!("Missing _distance column"))?;

        for i in 0..batch.num_rows() {
            let chunk = Chunk::try_new(
                paths.value(i),
                texts.value(i),
                starts.value(i).max(0) as usize,
                ends.value(i).max(0) as usize,
            );
            match chunk {
                Ok(chunk) => out.push(ScoredChunk {
                    chunk,
                    distance: distances.value(i),
                }),
                Err(e) => warn!(error = %e, row = i, "Skipping malformed stored chunk"),
            }
        }
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Missing {} column", name))
}

fn int64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| anyhow::anyhow!("Missing {} column", name))
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn rebuild(&self) -> Result<()> {
        if self.table_exists().await? {
            self.db
                .drop_table(TABLE_NAME)
                .await
                .with_context(|| format!("Failed to drop table {}", TABLE_NAME))?;
        }
        self.create_table().await?;
        info!(table = TABLE_NAME, "Vector store rebuilt");
        Ok(())
    }

    async fn upsert(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let table = self.get_or_create_table().await?;
        let batch = self.records_to_batch(&records)?;
        let batches = RecordBatchIterator::new(vec![Ok(batch)], Arc::new(self.table_schema()));

        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(batches))
            .await
            .context("Failed to upsert embeddings")?;

        debug!(count = records.len(), "Upserted embeddings");
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let Some(table) = self.open_table().await? else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let stream = table
            .vector_search(vector.to_vec())
            .context("Failed to create vector search query")?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut results = Vec::new();
        for batch in &batches {
            Self::batch_to_scored(batch, &mut results)?;
        }
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        match self.open_table().await? {
            Some(table) => table.count_rows(None).await.context("Failed to count rows"),
            None => Ok(0),
        }
    }

    fn backend_name(&self) -> &'static str {
        "lancedb"
    }
}
