//! DuckDuckGo Instant Answer search

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http_client;
use super::transport_error;
use super::SearchHit;
use super::WebSearch;
use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

impl DuckDuckGoSearch {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.tools.search_endpoint.trim_end_matches('/').to_string(),
            timeout_secs: config.tools.http_timeout_secs,
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        debug!("DuckDuckGo search: {}", query);

        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
            ])
            .send()
            .await
            .map_err(|e| transport_error("web search", self.timeout_secs, &e))?;

        if !response.status().is_success() {
            return Err(FinAgentsError::FetchError(format!(
                "DuckDuckGo search failed: {}",
                response.status()
            )));
        }

        // The API answers with `application/x-javascript`, so parse the body directly
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("web search", self.timeout_secs, &e))?;
        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            FinAgentsError::FetchError(format!("Malformed DuckDuckGo response: {e}"))
        })?;

        Ok(parse_results(&payload, max_results))
    }
}

/// Collect abstract, results and related topics; unique URLs, in page order
pub(crate) fn parse_results(payload: &Value, max_results: usize) -> Vec<SearchHit> {
    let mut results = Vec::new();

    if let Some(abstract_text) = payload.get("AbstractText").and_then(|v| v.as_str()) {
        if let Some(url) = payload.get("AbstractURL").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() && !url.is_empty() {
                let heading = payload
                    .get("Heading")
                    .and_then(|v| v.as_str())
                    .filter(|h| !h.is_empty());
                results.push(SearchHit {
                    title: heading
                        .unwrap_or_else(|| abstract_text.split(" - ").next().unwrap_or(abstract_text))
                        .to_string(),
                    url: url.to_string(),
                    snippet: abstract_text.to_string(),
                });
            }
        }
    }

    if let Some(items) = payload.get("Results").and_then(|v| v.as_array()) {
        extract_topics(items, &mut results);
    }
    if let Some(items) = payload.get("RelatedTopics").and_then(|v| v.as_array()) {
        extract_topics(items, &mut results);
    }

    let mut seen = std::collections::HashSet::new();
    results.retain(|hit| seen.insert(hit.url.clone()));
    results.truncate(max_results);
    results
}

fn extract_topics(items: &[Value], results: &mut Vec<SearchHit>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_topics(topics, results);
            continue;
        }
        let text = item.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchHit {
            title: text.split(" - ").next().unwrap_or(text).to_string(),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}
