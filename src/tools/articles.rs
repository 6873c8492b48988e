//! Article text extraction with readability

use std::io::Cursor;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::http_client;
use super::transport_error;
use super::Article;
use super::ArticleScraper;
use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::ingest::parse_document_url;

pub struct ReadabilityScraper {
    client: Client,
    max_chars: usize,
    timeout_secs: u64,
}

impl ReadabilityScraper {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            max_chars: config.tools.max_article_chars,
            timeout_secs: config.tools.http_timeout_secs,
        })
    }
}

#[async_trait]
impl ArticleScraper for ReadabilityScraper {
    async fn scrape(&self, url: &str) -> Result<Article> {
        let parsed_url = parse_document_url(url)?;
        debug!("Scraping article: {}", parsed_url);

        let response = self
            .client
            .get(parsed_url.as_str())
            .send()
            .await
            .map_err(|e| transport_error("article fetch", self.timeout_secs, &e))?;

        if !response.status().is_success() {
            return Err(FinAgentsError::FetchError(format!(
                "GET {parsed_url} returned HTTP {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FinAgentsError::FetchError(format!(
                "{parsed_url} does not return HTML content"
            )));
        }

        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error("article fetch", self.timeout_secs, &e))?;

        let article = tokio::task::spawn_blocking(move || extract_article(&body, &final_url))
            .await
            .map_err(|e| FinAgentsError::ParseError(format!("Extraction task failed: {e}")))??;

        Ok(Article {
            text: clip_chars(&article.text, self.max_chars),
            ..article
        })
    }
}

/// Main content of an HTML page
pub(crate) fn extract_article(html: &[u8], url: &url::Url) -> Result<Article> {
    let mut cursor = Cursor::new(html);
    let product = readability::extractor::extract(&mut cursor, url)
        .map_err(|e| FinAgentsError::ParseError(format!("Failed to extract article content: {e}")))?;

    let text = product
        .text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Err(FinAgentsError::ParseError(format!(
            "No article text found at {url}"
        )));
    }

    let title = if product.title.trim().is_empty() {
        url.host_str().unwrap_or("Untitled").to_string()
    } else {
        product.title.trim().to_string()
    };

    Ok(Article {
        url: url.to_string(),
        title,
        text,
    })
}

/// Keep at most `max` characters, cutting at a word boundary when one is near
fn clip_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max).collect();
    match clipped.rfind(' ') {
        Some(idx) if idx > max / 2 => format!("{}...", &clipped[..idx]),
        _ => format!("{clipped}..."),
    }
}
