//! Core data models used throughout the knowledge-base pipeline.
//!
//! These types represent the documents, chunks, and retrieval results that
//! flow from the upload boundary through ingestion and out of retrieval.

use serde::{Deserialize, Serialize};

/// A support document handed to the ingestion pipeline: the uploaded
/// filename plus its raw byte payload. Consumed once during ingestion and
/// not retained after chunking.
#[derive(Debug, Clone)]
pub struct SupportDoc {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// MIME-ish category derived from the filename extension at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Markdown,
    Json,
    Pdf,
    /// Unknown extension - lossy text decode fallback.
    Other,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => DocumentKind::Text,
            "md" => DocumentKind::Markdown,
            "json" => DocumentKind::Json,
            "pdf" => DocumentKind::Pdf,
            _ => DocumentKind::Other,
        }
    }
}

/// Parser output, tagged so callers can log degraded parses.
///
/// `Degraded` means a lossy fallback was taken (invalid UTF-8 replaced,
/// malformed JSON kept as raw text, unreadable PDF decoded as bytes). The
/// pipeline never aborts on a degraded parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedText {
    Clean(String),
    Degraded(String),
}

impl ParsedText {
    pub fn text(&self) -> &str {
        match self {
            ParsedText::Clean(t) | ParsedText::Degraded(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ParsedText::Clean(t) | ParsedText::Degraded(t) => t,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ParsedText::Degraded(_))
    }
}

/// A chunk record ready for indexing.
///
/// Identity is `"{filename}-{document_ordinal}-{chunk_index}"`, so a rebuild
/// from the same inputs produces the same ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: String,
    /// Filename of the document this chunk came from.
    pub source_document: String,
    /// Zero-based position within the source document.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of the chunk text, for staleness inspection.
    pub hash: String,
}

/// A ranked hit returned from an index-store query. Transient, not persisted.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub source_document: String,
    pub chunk_index: i64,
    pub text: String,
    /// Cosine similarity against the query embedding.
    pub score: f64,
}

/// Summary of a completed build, persisted in the store as the "built"
/// marker and returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub documents: u64,
    pub chunks: u64,
    /// Number of documents that needed a lossy parse fallback.
    pub degraded_parses: u64,
    pub model: String,
    pub dims: usize,
    /// Unix timestamp of build completion.
    pub built_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_filename("notes.md"), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_filename("spec.JSON"), DocumentKind::Json);
        assert_eq!(DocumentKind::from_filename("a.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("manual.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("archive.tar.gz"), DocumentKind::Other);
        assert_eq!(DocumentKind::from_filename("noextension"), DocumentKind::Other);
    }

    #[test]
    fn test_parsed_text_accessors() {
        let clean = ParsedText::Clean("hello".to_string());
        assert_eq!(clean.text(), "hello");
        assert!(!clean.is_degraded());

        let degraded = ParsedText::Degraded("best effort".to_string());
        assert!(degraded.is_degraded());
        assert_eq!(degraded.into_text(), "best effort");
    }
}
