//! In-memory [`IndexStore`] implementation for tests.
//!
//! State lives behind a `std::sync::RwLock`; similarity search is
//! brute-force cosine over all stored vectors, mirroring the SQLite
//! backend's semantics (including the unbuilt-until-marked lifecycle).

use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{BuildInfo, ChunkRecord, ScoredChunk};

use super::IndexStore;

#[derive(Default)]
struct State {
    initialized: bool,
    records: Vec<(ChunkRecord, Vec<f32>)>,
    reference_html: Option<String>,
    build_info: Option<BuildInfo>,
}

/// In-memory index store for unit tests.
#[derive(Default)]
pub struct InMemoryIndexStore {
    state: RwLock<State>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().unwrap();
        *state = State {
            initialized: true,
            ..State::default()
        };
        Ok(())
    }

    async fn set_reference_html(&self, html: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if !state.initialized {
            bail!("index store not initialized; run a build first");
        }
        state.reference_html = Some(html.to_string());
        Ok(())
    }

    async fn reference_html(&self) -> Result<Option<String>> {
        Ok(self.state.read().unwrap().reference_html.clone())
    }

    async fn add(&self, records: &[ChunkRecord], vectors: &[Vec<f32>]) -> Result<()> {
        if records.len() != vectors.len() {
            bail!(
                "record/vector count mismatch: {} records, {} vectors",
                records.len(),
                vectors.len()
            );
        }
        let mut state = self.state.write().unwrap();
        if !state.initialized {
            bail!("index store not initialized; run a build first");
        }
        for (record, vector) in records.iter().zip(vectors.iter()) {
            state.records.push((record.clone(), vector.clone()));
        }
        Ok(())
    }

    async fn mark_built(&self, info: &BuildInfo) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if !state.initialized {
            bail!("index store not initialized; run a build first");
        }
        state.build_info = Some(info.clone());
        Ok(())
    }

    async fn build_info(&self) -> Result<Option<BuildInfo>> {
        Ok(self.state.read().unwrap().build_info.clone())
    }

    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let state = self.state.read().unwrap();
        if !state.initialized {
            bail!("index store not initialized; run a build first");
        }

        let mut scored: Vec<ScoredChunk> = state
            .records
            .iter()
            .map(|(record, vector)| ScoredChunk {
                id: record.id.clone(),
                source_document: record.source_document.clone(),
                chunk_index: record.chunk_index,
                text: record.text.clone(),
                score: cosine_similarity(query_vec, vector) as f64,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
