//! Query embedding and nearest-passage lookup

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::models::CollectionInfo;
use crate::models::RetrievedPassage;
use crate::store::check_pin;
use crate::store::VectorStore;

/// Retriever for semantic search over one store
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Look up a collection and check it was embedded with the active model
    ///
    /// Unknown and empty collections are `NoContextError`.
    pub async fn pinned_collection(&self, collection_key: &str) -> Result<CollectionInfo> {
        let info = self
            .store
            .collection(collection_key)
            .await?
            .filter(|info| info.passage_count > 0)
            .ok_or_else(|| {
                FinAgentsError::NoContextError(format!(
                    "Collection '{collection_key}' does not exist or holds no passages"
                ))
            })?;

        check_pin(&info, self.embedder.model(), self.embedder.dimension())?;
        Ok(info)
    }

    /// Semantic search using vector embeddings
    pub async fn semantic_search(
        &self,
        collection_key: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        debug!("Performing semantic search in '{}': {}", collection_key, query);

        let query_embedding = self.embedder.embed(query).await?;
        let results = self
            .store
            .similarity_search(collection_key, &query_embedding, limit)
            .await?;

        debug!("Retrieved {} passages", results.len());
        Ok(results)
    }
}
