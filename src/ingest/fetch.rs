//! Document download over HTTP(S)

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Document formats the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Text,
    Markdown,
}

impl ContentKind {
    /// Resolve the format from the declared content type, the leading bytes
    /// and the URL extension, in that order of trust for the magic bytes
    pub fn resolve(content_type: Option<&str>, url: &Url, bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            return Some(Self::Pdf);
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("application/pdf") => Some(Self::Pdf),
            Some("text/plain") => Some(Self::Text),
            Some("text/markdown" | "text/x-markdown") => Some(Self::Markdown),
            None | Some("application/octet-stream" | "binary/octet-stream") => {
                Self::from_extension(url)
            }
            Some(_) => None,
        }
    }

    fn from_extension(url: &Url) -> Option<Self> {
        let path = url.path().to_ascii_lowercase();
        if path.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if path.ends_with(".txt") {
            Some(Self::Text)
        } else if path.ends_with(".md") || path.ends_with(".markdown") {
            Some(Self::Markdown)
        } else {
            None
        }
    }
}

/// Raw bytes of a downloaded document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects
    pub url: String,
    pub kind: ContentKind,
    pub bytes: Vec<u8>,
}

/// Accept only absolute http(s) URLs
pub fn parse_document_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| FinAgentsError::ValidationError(format!("Invalid URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FinAgentsError::ValidationError(format!(
            "Unsupported URL scheme '{other}' (expected http or https)"
        ))),
    }
}

pub struct DocumentFetcher {
    client: Client,
    max_bytes: usize,
    timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.tools.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FinAgentsError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            max_bytes: config.ingest.max_document_bytes,
            timeout: config.fetch_timeout(),
        })
    }

    /// Download a document and classify its format
    pub async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        debug!("Fetching document: {}", url);

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FinAgentsError::FetchError(format!(
                "GET {url} returned HTTP {status}"
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(self.too_large(url));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(url, &e))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }

        let kind = ContentKind::resolve(content_type.as_deref(), &final_url, &bytes).ok_or_else(
            || {
                FinAgentsError::FetchError(format!(
                    "Unsupported content type '{}' at {url}",
                    content_type.as_deref().unwrap_or("unknown")
                ))
            },
        )?;

        debug!("Fetched {} bytes ({:?}) from {}", bytes.len(), kind, final_url);
        Ok(FetchedDocument {
            url: final_url.to_string(),
            kind,
            bytes,
        })
    }

    fn too_large(&self, url: &Url) -> FinAgentsError {
        FinAgentsError::FetchError(format!(
            "Document at {url} exceeds the {} byte limit",
            self.max_bytes
        ))
    }

    fn transport_error(&self, url: &Url, error: &reqwest::Error) -> FinAgentsError {
        if error.is_timeout() {
            FinAgentsError::timeout(format!("fetching {url}"), self.timeout.as_secs())
        } else {
            FinAgentsError::FetchError(format!("Failed to fetch {url}: {error}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_magic_bytes_win() {
        let kind = ContentKind::resolve(
            Some("application/octet-stream"),
            &url("https://example.com/download"),
            b"%PDF-1.7\n...",
        );
        assert_eq!(kind, Some(ContentKind::Pdf));
    }

    #[test]
    fn test_declared_types() {
        let u = url("https://example.com/file");
        assert_eq!(
            ContentKind::resolve(Some("text/plain; charset=utf-8"), &u, b"hello"),
            Some(ContentKind::Text)
        );
        assert_eq!(
            ContentKind::resolve(Some("text/markdown"), &u, b"# hi"),
            Some(ContentKind::Markdown)
        );
        assert_eq!(ContentKind::resolve(Some("image/png"), &u, b"\x89PNG"), None);
        assert_eq!(ContentKind::resolve(Some("text/html"), &u, b"<html>"), None);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            ContentKind::resolve(None, &url("https://example.com/notes.MD"), b"# hi"),
            Some(ContentKind::Markdown)
        );
        assert_eq!(
            ContentKind::resolve(None, &url("https://example.com/archive.zip"), b"PK"),
            None
        );
    }

    #[test]
    fn test_parse_document_url() {
        assert!(parse_document_url("https://example.com/a.pdf").is_ok());
        assert!(matches!(
            parse_document_url("ftp://example.com/a.pdf"),
            Err(FinAgentsError::ValidationError(_))
        ));
        assert!(matches!(
            parse_document_url("not a url"),
            Err(FinAgentsError::ValidationError(_))
        ));
    }
}
