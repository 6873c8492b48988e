//! Embeddings generation module
//!
//! This module turns text into fixed-length vectors using one of:
//! - OpenAI-compatible `/embeddings` endpoints (native batching)
//! - Ollama (local models such as `all-minilm`, one request per text)
//!
//! # Examples
//!
//! ```rust,no_run
//! use finagents::config::AppConfig;
//! use finagents::embeddings::Embedder;
//! use finagents::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;
pub mod text_preprocessing;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Maximum batch size for a single provider request
pub const MAX_BATCH_SIZE: usize = 100;

/// Turns text into vectors of a fixed dimensionality
///
/// The dimensionality is constant for the lifetime of an implementation and
/// batch output preserves input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name; collections are pinned to it
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_concurrency: usize,
    pub timeout: std::time::Duration,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let provider = match config.embeddings.provider.to_ascii_lowercase().as_str() {
            "ollama" => EmbeddingProvider::Ollama,
            "openai" => EmbeddingProvider::OpenAI,
            other => {
                return Err(FinAgentsError::ConfigError(format!(
                    "Unknown embedding provider '{other}' (expected 'ollama' or 'openai')"
                )))
            }
        };

        Ok(Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: config.embeddings.api_key.clone(),
            request_concurrency: config.embeddings.request_concurrency.max(1),
            timeout: config.llm_timeout(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_provider_from_config() {
        let mut config = AppConfig::default();
        let embedding_config = EmbeddingConfig::from_app_config(&config).unwrap();
        assert_eq!(embedding_config.provider, EmbeddingProvider::Ollama);
        assert_eq!(embedding_config.dimension, 384);

        config.embeddings.provider = "OpenAI".to_string();
        config.embeddings.endpoint = "https://api.openai.com/v1/".to_string();
        let embedding_config = EmbeddingConfig::from_app_config(&config).unwrap();
        assert_eq!(embedding_config.provider, EmbeddingProvider::OpenAI);
        assert_eq!(embedding_config.endpoint, "https://api.openai.com/v1");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.embeddings.provider = "sentence-transformers".to_string();
        assert!(matches!(
            EmbeddingConfig::from_app_config(&config),
            Err(FinAgentsError::ConfigError(_))
        ));
    }
}
