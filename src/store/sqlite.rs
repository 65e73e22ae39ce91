//! Directory-backed [`IndexStore`] on SQLite.
//!
//! The collection lives in `<dir>/index.sqlite`. `reset()` physically
//! deletes and recreates the directory, so stale WAL/SHM files from a
//! previous build can never leak into the new collection. Similarity search
//! is brute-force cosine over all stored vectors, computed in Rust.
//!
//! Connections are opened per operation and closed before returning - the
//! store never holds a pool across a reset.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::PathBuf;
use std::str::FromStr;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{BuildInfo, ChunkRecord, ScoredChunk};

use super::IndexStore;

const DB_FILE: &str = "index.sqlite";
const META_BUILD_INFO: &str = "build_info";
const META_REFERENCE_HTML: &str = "reference_html";

pub struct SqliteIndexStore {
    dir: PathBuf,
}

impl SqliteIndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.join(DB_FILE)
    }

    async fn connect(&self, create: bool) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}",
            self.db_path().display()
        ))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(pool)
    }

    /// Open the existing collection, failing if no reset has created one.
    async fn open_existing(&self) -> Result<SqlitePool> {
        if !self.db_path().exists() {
            bail!(
                "index store not initialized at {}; run a build first",
                self.dir.display()
            );
        }
        self.connect(false).await
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let pool = self.open_existing().await?;
        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&pool)
            .await?;
        pool.close().await;
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        if !self.db_path().exists() {
            return Ok(None);
        }
        let pool = self.connect(false).await?;
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&pool)
            .await?;
        pool.close().await;
        Ok(value)
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_document TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    async fn reset(&self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        std::fs::create_dir_all(&self.dir)?;

        let pool = self.connect(true).await?;
        create_schema(&pool).await?;
        pool.close().await;
        Ok(())
    }

    async fn set_reference_html(&self, html: &str) -> Result<()> {
        self.set_meta(META_REFERENCE_HTML, html).await
    }

    async fn reference_html(&self) -> Result<Option<String>> {
        self.get_meta(META_REFERENCE_HTML).await
    }

    async fn add(&self, records: &[ChunkRecord], vectors: &[Vec<f32>]) -> Result<()> {
        if records.len() != vectors.len() {
            bail!(
                "record/vector count mismatch: {} records, {} vectors",
                records.len(),
                vectors.len()
            );
        }

        let pool = self.open_existing().await?;
        let mut tx = pool.begin().await?;
        for (record, vector) in records.iter().zip(vectors.iter()) {
            sqlx::query(
                "INSERT INTO chunks (id, source_document, chunk_index, text, hash, embedding) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.id)
            .bind(&record.source_document)
            .bind(record.chunk_index)
            .bind(&record.text)
            .bind(&record.hash)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        pool.close().await;
        Ok(())
    }

    async fn mark_built(&self, info: &BuildInfo) -> Result<()> {
        self.set_meta(META_BUILD_INFO, &serde_json::to_string(info)?)
            .await
    }

    async fn build_info(&self) -> Result<Option<BuildInfo>> {
        match self.get_meta(META_BUILD_INFO).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let pool = self.open_existing().await?;

        // rowid preserves insertion order, which is the tie order we promise.
        let rows = sqlx::query(
            "SELECT id, source_document, chunk_index, text, embedding FROM chunks ORDER BY rowid",
        )
        .fetch_all(&pool)
        .await?;
        pool.close().await;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                ScoredChunk {
                    id: row.get("id"),
                    source_document: row.get("source_document"),
                    chunk_index: row.get("chunk_index"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &vector) as f64,
                }
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
