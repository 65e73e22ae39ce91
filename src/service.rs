//! Owned knowledge-base handle.
//!
//! [`KnowledgeBase`] owns the index store, the embedding gateway, and the
//! chunking parameters - there is no process-wide mutable state. A
//! `tokio::sync::RwLock` gate makes builds exclusive: a build (writer)
//! can never interleave with retrievals (readers), which would otherwise be
//! able to observe the destroy-then-recreate window of a rebuild. Two
//! concurrent builds serialize arbitrarily; the last completed build wins.

use anyhow::{bail, Result};
use tokio::sync::RwLock;

use crate::config::ChunkingConfig;
use crate::embedding::Embedder;
use crate::error::KbError;
use crate::ingest::build_knowledge_base;
use crate::models::{BuildInfo, SupportDoc};
use crate::retrieve::retrieve_context;
use crate::store::IndexStore;

pub struct KnowledgeBase {
    store: Box<dyn IndexStore>,
    embedder: Box<dyn Embedder>,
    chunking: ChunkingConfig,
    gate: RwLock<()>,
}

impl KnowledgeBase {
    /// Fails fast on invalid chunking parameters, before any build work.
    pub fn new(
        store: Box<dyn IndexStore>,
        embedder: Box<dyn Embedder>,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        if chunking.chunk_size == 0 || chunking.overlap >= chunking.chunk_size {
            bail!(KbError::Configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                chunking.overlap, chunking.chunk_size
            )));
        }
        Ok(Self {
            store,
            embedder,
            chunking,
            gate: RwLock::new(()),
        })
    }

    /// Rebuild the knowledge base from `docs` and the reference HTML page.
    /// Destroys the previous build entirely; see [`crate::ingest`].
    pub async fn build(&self, docs: &[SupportDoc], reference_html: &str) -> Result<BuildInfo> {
        let _guard = self.gate.write().await;
        build_knowledge_base(
            self.store.as_ref(),
            self.embedder.as_ref(),
            &self.chunking,
            docs,
            reference_html,
        )
        .await
    }

    /// Retrieve a formatted context string for `query`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<String> {
        let _guard = self.gate.read().await;
        retrieve_context(self.store.as_ref(), self.embedder.as_ref(), query, top_k).await
    }

    /// The reference HTML stored by the latest build, if any.
    pub async fn reference_html(&self) -> Result<Option<String>> {
        let _guard = self.gate.read().await;
        self.store.reference_html().await
    }

    /// Build metadata for the current knowledge base; `None` until a build
    /// completes successfully.
    pub async fn status(&self) -> Result<Option<BuildInfo>> {
        let _guard = self.gate.read().await;
        self.store.build_info().await
    }
}
