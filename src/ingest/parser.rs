//! Turn fetched bytes into pages of text

use sha2::Digest;
use sha2::Sha256;

use super::fetch::ContentKind;
use super::fetch::FetchedDocument;
use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Page separator in plain-text documents
const FORM_FEED: char = '\u{000C}';

/// A document as an ordered list of page texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub source_url: String,
    /// First 16 hex characters of SHA-256 over the raw bytes
    pub document_id: String,
    pub pages: Vec<String>,
}

impl ParsedDocument {
    /// Build from text already in memory; form feeds separate pages
    pub fn from_text(source_url: impl Into<String>, text: &str) -> Result<Self> {
        Self::new(source_url.into(), text.as_bytes(), split_pages(text))
    }

    fn new(source_url: String, bytes: &[u8], pages: Vec<String>) -> Result<Self> {
        if pages.iter().all(|page| page.trim().is_empty()) {
            return Err(FinAgentsError::ParseError(format!(
                "No extractable text in {source_url}"
            )));
        }

        Ok(Self {
            source_url,
            document_id: document_id(bytes),
            pages,
        })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Content-derived id, stable across fetches of identical bytes
#[must_use]
pub fn document_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..8])
}

/// Parse a fetched document
///
/// PDF extraction is CPU-bound; callers on an async runtime should run this
/// on a blocking thread.
pub fn parse(document: &FetchedDocument) -> Result<ParsedDocument> {
    let pages = match document.kind {
        ContentKind::Pdf => parse_pdf(&document.bytes)?,
        ContentKind::Text | ContentKind::Markdown => parse_text(&document.bytes)?,
    };

    ParsedDocument::new(document.url.clone(), &document.bytes, pages)
}

fn parse_pdf(bytes: &[u8]) -> Result<Vec<String>> {
    // pdf-extract panics on some malformed inputs instead of returning an error
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| FinAgentsError::ParseError("PDF extraction aborted".to_string()))?
        .map_err(|e| FinAgentsError::ParseError(format!("Unreadable PDF: {e}")))?;
    Ok(pages)
}

fn parse_text(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FinAgentsError::ParseError(format!("Document is not valid UTF-8: {e}")))?;
    Ok(split_pages(text.trim_start_matches('\u{FEFF}')))
}

fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    // A trailing separator does not open a new page
    while pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(kind: ContentKind, bytes: &[u8]) -> FetchedDocument {
        FetchedDocument {
            url: "https://example.com/doc".to_string(),
            kind,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_document_id_is_stable_and_short() {
        let a = document_id(b"annual report");
        assert_eq!(a.len(), 16);
        assert_eq!(a, document_id(b"annual report"));
        assert_ne!(a, document_id(b"annual report v2"));
    }

    #[test]
    fn test_text_pages_split_on_form_feed() {
        let doc = parse(&fetched(
            ContentKind::Text,
            "page one\u{000C}page two\u{000C}page three\u{000C}".as_bytes(),
        ))
        .unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.pages[1], "page two");
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let result = parse(&fetched(ContentKind::Text, &[0xff, 0xfe, 0x00, 0x41]));
        assert!(matches!(result, Err(FinAgentsError::ParseError(_))));
    }

    #[test]
    fn test_blank_document_is_parse_error() {
        let result = parse(&fetched(ContentKind::Markdown, b"  \n\n\t "));
        assert!(matches!(result, Err(FinAgentsError::ParseError(_))));
    }

    #[test]
    fn test_corrupt_pdf_is_parse_error() {
        let result = parse(&fetched(ContentKind::Pdf, b"%PDF-1.4\nthis is not a pdf body"));
        assert!(matches!(result, Err(FinAgentsError::ParseError(_))));
    }

    #[test]
    fn test_from_text() {
        let doc = ParsedDocument::from_text("memory://notes", "only page").unwrap();
        assert_eq!(doc.pages, vec!["only page".to_string()]);
        assert_eq!(doc.document_id, document_id(b"only page"));
    }
}
