//! Sliding-window text chunker.
//!
//! Splits normalized document text into fixed-size overlapping windows of
//! `chunk_size` characters, each window starting `chunk_size - overlap`
//! characters after the previous one. The final window always ends exactly
//! at the end of the text, with no duplicate trailing chunk.
//!
//! Windows are measured in characters, not bytes, so multi-byte UTF-8 text
//! never splits inside a code point.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::error::KbError;
use crate::models::ChunkRecord;

/// Split text into overlapping windows. Leading/trailing whitespace is
/// trimmed first; empty input yields an empty sequence.
///
/// Fails fast with [`KbError::Configuration`] when `overlap >= chunk_size`
/// (the window would stop advancing) or `chunk_size == 0`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(KbError::Configuration(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        ))
        .into());
    }

    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = usize::min(start + chunk_size, chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        // overlap < chunk_size guarantees forward progress
        start = end - overlap;
    }

    Ok(chunks)
}

/// Chunk one parsed document into indexable records.
///
/// Ids encode `(filename, document ordinal, chunk index)`, so rebuilding
/// from the same inputs produces the same ids.
pub fn chunk_document(
    filename: &str,
    doc_ordinal: usize,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<ChunkRecord>> {
    let windows = chunk_text(text, chunk_size, overlap)?;

    Ok(windows
        .into_iter()
        .enumerate()
        .map(|(idx, piece)| {
            let mut hasher = Sha256::new();
            hasher.update(piece.as_bytes());
            let hash = format!("{:x}", hasher.finalize());

            ChunkRecord {
                id: format!("{}-{}-{}", filename, doc_ordinal, idx),
                source_document: filename.to_string(),
                chunk_index: idx as i64,
                text: piece,
                hash,
            }
        })
        .collect())
}
