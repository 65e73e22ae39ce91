//! Typed error kinds for the knowledge-base pipeline.
//!
//! Most code propagates `anyhow::Result`; the pipeline boundaries wrap
//! failures in [`KbError`] so callers can downcast to a specific kind.
//! Lossy parses are deliberately *not* an error kind - the parser degrades
//! to best-effort text and tags the result instead (see [`crate::models::ParsedText`]).

use std::fmt;

/// Error kinds surfaced by `build` and `retrieve`.
#[derive(Debug)]
pub enum KbError {
    /// Chunking parameters are invalid (`overlap` must be smaller than
    /// `chunk_size`). Raised before any chunking work begins.
    Configuration(String),
    /// Retrieval was attempted before any successful build, or after a
    /// build that failed partway through.
    IndexUnavailable,
    /// The embedding gateway failed; the current build or retrieval call
    /// is aborted without retry.
    Embedding(String),
    /// The index storage layer failed; same propagation policy as
    /// [`KbError::Embedding`].
    Store(String),
}

impl fmt::Display for KbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KbError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            KbError::IndexUnavailable => {
                write!(f, "knowledge base has not been built; run a build first")
            }
            KbError::Embedding(msg) => write!(f, "embedding gateway failed: {}", msg),
            KbError::Store(msg) => write!(f, "index store failed: {}", msg),
        }
    }
}

impl std::error::Error for KbError {}
