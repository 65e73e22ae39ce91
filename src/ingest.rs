//! Ingestion pipeline orchestration.
//!
//! Drives parse → chunk → embed → index for a batch of support documents.
//! Builds are full rebuilds: the previous collection is destroyed before the
//! new one is populated, and the "built" marker is written only after every
//! chunk is indexed. A failure after the reset therefore leaves the store
//! empty and unbuilt - callers must retry the whole build, not resume it.

use anyhow::{bail, Result};

use crate::chunk::chunk_document;
use crate::config::ChunkingConfig;
use crate::embedding::Embedder;
use crate::error::KbError;
use crate::models::{BuildInfo, SupportDoc};
use crate::parse::parse_document;
use crate::store::IndexStore;

/// Rebuild the knowledge base from scratch.
///
/// Documents are processed in input order; chunk ids carry each document's
/// ordinal, so the same input batch always produces the same ids. All chunk
/// texts across all documents are embedded in one batched gateway call and
/// added to the store in one operation.
pub async fn build_knowledge_base(
    store: &dyn IndexStore,
    embedder: &dyn Embedder,
    chunking: &ChunkingConfig,
    docs: &[SupportDoc],
    reference_html: &str,
) -> Result<BuildInfo> {
    store
        .reset()
        .await
        .map_err(|e| KbError::Store(format!("{:#}", e)))?;
    store
        .set_reference_html(reference_html)
        .await
        .map_err(|e| KbError::Store(format!("{:#}", e)))?;

    let mut records = Vec::new();
    let mut degraded = 0u64;

    for (ordinal, doc) in docs.iter().enumerate() {
        let parsed = parse_document(&doc.bytes, &doc.filename);
        if parsed.is_degraded() {
            degraded += 1;
            eprintln!("Warning: lossy parse for {}", doc.filename);
        }
        records.extend(chunk_document(
            &doc.filename,
            ordinal,
            parsed.text(),
            chunking.chunk_size,
            chunking.overlap,
        )?);
    }

    if !records.is_empty() {
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .map_err(|e| KbError::Embedding(format!("{:#}", e)))?;
        if vectors.len() != records.len() {
            bail!(KbError::Embedding(format!(
                "gateway returned {} vectors for {} chunks",
                vectors.len(),
                records.len()
            )));
        }
        store
            .add(&records, &vectors)
            .await
            .map_err(|e| KbError::Store(format!("{:#}", e)))?;
    }

    let info = BuildInfo {
        documents: docs.len() as u64,
        chunks: records.len() as u64,
        degraded_parses: degraded,
        model: embedder.model_name().to_string(),
        dims: embedder.dims(),
        built_at: chrono::Utc::now().timestamp(),
    };
    store
        .mark_built(&info)
        .await
        .map_err(|e| KbError::Store(format!("{:#}", e)))?;

    Ok(info)
}
