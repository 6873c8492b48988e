//! Embedding generation service with batching and output validation

use async_trait::async_trait;
use tracing::debug;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::preprocess_text_for_embedding;
use super::Embedder;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Service for generating embeddings with one pinned model and dimension
pub struct EmbeddingService {
    client: EmbeddingClient,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config)?)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() == self.config.dimension {
            Ok(())
        } else {
            Err(FinAgentsError::EmbeddingError(format!(
                "Model {} returned {} dimensions, expected {}",
                self.config.model,
                embedding.len(),
                self.config.dimension
            )))
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let processed_text = preprocess_text_for_embedding(text)?;
        let embedding = self.client.generate(&processed_text).await?;
        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    /// Generate embeddings for multiple texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(FinAgentsError::EmbeddingError(
                "Empty batch provided".to_string(),
            ));
        }

        let processed_texts = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                preprocess_text_for_embedding(text).map_err(|e| {
                    FinAgentsError::EmbeddingError(format!("Batch item {idx}: {e}"))
                })
            })
            .collect::<Result<Vec<String>>>()?;

        let mut embeddings = Vec::with_capacity(processed_texts.len());
        for chunk in processed_texts.chunks(MAX_BATCH_SIZE) {
            debug!("Embedding batch of {} texts", chunk.len());
            let chunk_embeddings = self.client.generate_batch(chunk).await?;

            if chunk_embeddings.len() != chunk.len() {
                return Err(FinAgentsError::EmbeddingError(format!(
                    "Provider returned {} embeddings for {} inputs",
                    chunk_embeddings.len(),
                    chunk.len()
                )));
            }
            embeddings.extend(chunk_embeddings);
        }

        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }

        Ok(embeddings)
    }
}
