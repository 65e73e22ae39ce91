//! Index store abstraction.
//!
//! An index store is a single collection mapping chunk id → (text, metadata,
//! embedding) with a full-rebuild lifecycle: [`reset`](IndexStore::reset)
//! destroys whatever existed and leaves an empty, *unbuilt* collection;
//! [`mark_built`](IndexStore::mark_built) flips it to built once ingestion
//! completes. Retrieval treats an unbuilt collection as unavailable, so a
//! build that fails between those two calls leaves the system in an explicit
//! "not built" state rather than silently serving a partial index.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BuildInfo, ChunkRecord, ScoredChunk};

/// Abstract index store backing the knowledge base.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`reset`](IndexStore::reset) | Destroy the collection and create an empty, unbuilt one |
/// | [`set_reference_html`](IndexStore::set_reference_html) | Store the reference HTML for the current build |
/// | [`reference_html`](IndexStore::reference_html) | Latest stored reference HTML |
/// | [`add`](IndexStore::add) | Bulk-insert chunk records with their embeddings |
/// | [`mark_built`](IndexStore::mark_built) | Record build completion metadata |
/// | [`build_info`](IndexStore::build_info) | Build metadata; `None` until a build completes |
/// | [`query`](IndexStore::query) | Top-k nearest neighbors by cosine similarity |
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Destroy any existing collection and create an empty, unbuilt one.
    async fn reset(&self) -> Result<()>;

    /// Store the reference HTML alongside the collection.
    async fn set_reference_html(&self, html: &str) -> Result<()>;

    /// The latest stored reference HTML, if any build has stored one.
    async fn reference_html(&self) -> Result<Option<String>>;

    /// Bulk-insert chunk records with their embedding vectors.
    /// `records` and `vectors` must be the same length and aligned by index.
    async fn add(&self, records: &[ChunkRecord], vectors: &[Vec<f32>]) -> Result<()>;

    /// Mark the collection as fully built.
    async fn mark_built(&self, info: &BuildInfo) -> Result<()>;

    /// Build metadata for the collection; `None` means no successful build.
    async fn build_info(&self) -> Result<Option<BuildInfo>>;

    /// Return at most `top_k` chunks ranked by descending cosine similarity
    /// to `query_vec`. Ties keep the store's native (insertion) order.
    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;
}
