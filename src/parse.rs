//! Support-document normalization.
//!
//! Converts uploaded bytes into a single text blob per document. Parsing is
//! fail-open: malformed input degrades to a best-effort lossy decode, tagged
//! as [`ParsedText::Degraded`] so the caller can log it, and never blocks
//! the pipeline.
//!
//! Supported formats:
//! - `.txt` / `.md` - UTF-8 decode, invalid sequences replaced
//! - `.json` - canonicalized to 2-space-indented JSON; raw text on parse failure
//! - `.pdf` - text extraction via `pdf-extract`; lossy decode on failure
//! - anything else - lossy UTF-8 decode

use crate::models::{DocumentKind, ParsedText};

/// Parse a document's bytes into normalized text. Never fails.
pub fn parse_document(bytes: &[u8], filename: &str) -> ParsedText {
    match DocumentKind::from_filename(filename) {
        DocumentKind::Text | DocumentKind::Markdown => decode_text(bytes),
        DocumentKind::Json => parse_json(bytes),
        DocumentKind::Pdf => parse_pdf(bytes),
        DocumentKind::Other => decode_text(bytes),
    }
}

/// UTF-8 decode. Tagged `Degraded` only when replacement actually occurred.
fn decode_text(bytes: &[u8]) -> ParsedText {
    match std::str::from_utf8(bytes) {
        Ok(text) => ParsedText::Clean(text.to_string()),
        Err(_) => ParsedText::Degraded(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Canonicalize JSON formatting while preserving all data. Falls back to the
/// raw lossy decode when the payload is not valid JSON.
fn parse_json(bytes: &[u8]) -> ParsedText {
    let raw = String::from_utf8_lossy(bytes);
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => ParsedText::Clean(pretty),
            Err(_) => ParsedText::Degraded(raw.into_owned()),
        },
        Err(_) => ParsedText::Degraded(raw.into_owned()),
    }
}

fn parse_pdf(bytes: &[u8]) -> ParsedText {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => ParsedText::Clean(text),
        Err(_) => ParsedText::Degraded(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_clean_decode() {
        let parsed = parse_document(b"# Title\n\nBody text.", "guide.md");
        assert_eq!(parsed, ParsedText::Clean("# Title\n\nBody text.".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_degraded_not_fatal() {
        let parsed = parse_document(&[0x66, 0x6f, 0xff, 0x6f], "notes.txt");
        assert!(parsed.is_degraded());
        assert!(parsed.text().contains('\u{FFFD}'));
    }

    #[test]
    fn test_json_canonicalized_to_two_space_indent() {
        let parsed = parse_document(b"{\"a\":1}", "spec.json");
        assert_eq!(parsed, ParsedText::Clean("{\n  \"a\": 1\n}".to_string()));
    }

    #[test]
    fn test_json_preserves_nested_data() {
        let parsed = parse_document(b"{\"a\":{\"b\":[1,2]}}", "spec.json");
        let value: serde_json::Value = serde_json::from_str(parsed.text()).unwrap();
        assert_eq!(value["a"]["b"][1], 2);
    }

    #[test]
    fn test_malformed_json_falls_back_to_raw() {
        let parsed = parse_document(b"{not json", "spec.json");
        assert!(parsed.is_degraded());
        assert_eq!(parsed.text(), "{not json");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_lossy_decode() {
        let parsed = parse_document(b"plain enough", "readme.xyz");
        assert_eq!(parsed.text(), "plain enough");
        assert!(!parsed.is_degraded());
    }

    #[test]
    fn test_unreadable_pdf_degrades() {
        let parsed = parse_document(b"not a pdf", "manual.pdf");
        assert!(parsed.is_degraded());
    }
}
