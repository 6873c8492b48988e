//! Vector store seam
//!
//! The retrieval pipeline talks to passage storage only through
//! [`VectorStore`]. Two implementations exist:
//! - [`crate::database::PgVectorStore`]: PostgreSQL with the pgvector extension
//! - [`InMemoryVectorStore`]: process-local, used by tests and `--in-memory` runs
//!
//! Both score by cosine similarity, so results are comparable across backends.

mod memory;

use async_trait::async_trait;
pub use memory::InMemoryVectorStore;

use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::models::CollectionInfo;
use crate::models::PassageBatch;
use crate::models::RetrievedPassage;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Write every passage of one document, or nothing
    ///
    /// Passages of the same document already in the collection are replaced.
    /// Returns the number of passages written.
    async fn upsert(&self, batch: &PassageBatch) -> Result<usize>;

    /// Nearest passages by cosine similarity, most similar first
    ///
    /// Unknown or empty collections yield an empty result.
    async fn similarity_search(
        &self,
        collection_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedPassage>>;

    async fn collection(&self, collection_key: &str) -> Result<Option<CollectionInfo>>;

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Returns `false` when the collection did not exist
    async fn delete_collection(&self, collection_key: &str) -> Result<bool>;
}

pub(crate) fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(FinAgentsError::ValidationError(
            "k must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Reject malformed batches before anything is written
pub(crate) fn validate_batch(batch: &PassageBatch) -> Result<()> {
    if batch.passages.is_empty() {
        return Err(FinAgentsError::StoreError(format!(
            "Empty passage batch for document {}",
            batch.document_id
        )));
    }

    for passage in &batch.passages {
        if passage.collection_key != batch.collection_key
            || passage.document_id != batch.document_id
        {
            return Err(FinAgentsError::StoreError(format!(
                "Passage {} does not belong to batch {}/{}",
                passage.passage_id, batch.collection_key, batch.document_id
            )));
        }
        if passage.embedding.len() != batch.dimension {
            return Err(FinAgentsError::StoreError(format!(
                "Passage {} has {} dimensions, batch declares {}",
                passage.passage_id,
                passage.embedding.len(),
                batch.dimension
            )));
        }
    }

    Ok(())
}

/// A collection accepts only vectors from the model it was created with
pub(crate) fn check_pin(existing: &CollectionInfo, embedding_model: &str, dimension: usize) -> Result<()> {
    if existing.embedding_model == embedding_model && existing.dimension == dimension {
        return Ok(());
    }
    Err(FinAgentsError::EmbeddingMismatch {
        collection: existing.collection_key.clone(),
        expected: existing.embedding_label(),
        actual: format!("{embedding_model}/{dimension}"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::Passage;

    fn batch(dimension: usize) -> PassageBatch {
        PassageBatch {
            collection_key: "report".to_string(),
            embedding_model: "all-minilm".to_string(),
            dimension,
            document_id: "doc".to_string(),
            source_url: "https://example.com/a.pdf".to_string(),
            passages: vec![Passage {
                passage_id: Passage::make_id("doc", 0),
                collection_key: "report".to_string(),
                document_id: "doc".to_string(),
                source_url: "https://example.com/a.pdf".to_string(),
                sequence_index: 0,
                page: 1,
                text: "hello".to_string(),
                token_count: 1,
                embedding: vec![1.0, 0.0],
            }],
        }
    }

    #[test]
    fn test_validate_k() {
        assert!(matches!(validate_k(0), Err(FinAgentsError::ValidationError(_))));
        assert!(validate_k(1).is_ok());
    }

    #[test]
    fn test_validate_batch_dimension() {
        assert!(validate_batch(&batch(2)).is_ok());
        assert!(matches!(
            validate_batch(&batch(3)),
            Err(FinAgentsError::StoreError(_))
        ));
    }

    #[test]
    fn test_check_pin() {
        let info = CollectionInfo {
            collection_key: "report".to_string(),
            embedding_model: "all-minilm".to_string(),
            dimension: 384,
            passage_count: 1,
            document_count: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(check_pin(&info, "all-minilm", 384).is_ok());
        let err = check_pin(&info, "nomic-embed-text", 768).unwrap_err();
        assert!(err.to_string().contains("all-minilm/384"));
        assert!(err.to_string().contains("nomic-embed-text/768"));
    }
}
