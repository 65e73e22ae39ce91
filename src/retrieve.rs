//! Retrieval service: query embedding, ranking, and context formatting.
//!
//! Embeds a natural-language query with the same gateway used at ingestion,
//! asks the index store for the top-k nearest chunks, and formats them into
//! one labeled context string for the downstream generation layer.

use anyhow::{bail, Result};

use crate::embedding::{embed_query, Embedder};
use crate::error::KbError;
use crate::models::ScoredChunk;
use crate::store::IndexStore;

/// Retrieve the most relevant chunks for `query` as a single context string.
///
/// Results are ordered by descending similarity as reported by the store.
/// Zero neighbors (an empty but successfully built index) yield `""`;
/// a knowledge base with no completed build is a precondition failure
/// ([`KbError::IndexUnavailable`]), not an empty context.
pub async fn retrieve_context(
    store: &dyn IndexStore,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
) -> Result<String> {
    let built = store
        .build_info()
        .await
        .map_err(|e| KbError::Store(format!("{:#}", e)))?;
    if built.is_none() {
        bail!(KbError::IndexUnavailable);
    }

    let query_vec = embed_query(embedder, query)
        .await
        .map_err(|e| KbError::Embedding(format!("{:#}", e)))?;

    let hits = store
        .query(&query_vec, top_k)
        .await
        .map_err(|e| KbError::Store(format!("{:#}", e)))?;

    Ok(format_context(&hits))
}

/// Join labeled chunk blocks with a blank-line separator.
pub fn format_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_block(hit: &ScoredChunk) -> String {
    format!(
        "[Source: {}, Chunk: {}]\n{}",
        hit.source_document, hit.chunk_index, hit.text
    )
}
