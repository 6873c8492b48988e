//! Process-local vector store
//!
//! Collections live in a `HashMap` behind a `tokio::sync::RwLock`. An upsert
//! holds the write lock for the whole batch, so readers never see a
//! half-written document.

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::check_pin;
use super::validate_batch;
use super::validate_k;
use super::VectorStore;
use crate::errors::Result;
use crate::models::CollectionInfo;
use crate::models::Passage;
use crate::models::PassageBatch;
use crate::models::RetrievedPassage;

#[derive(Debug)]
struct Collection {
    info: CollectionInfo,
    /// Keyed by passage id
    passages: BTreeMap<String, Passage>,
}

impl Collection {
    fn refresh_counts(&mut self) {
        let mut documents: Vec<&str> = self
            .passages
            .values()
            .map(|p| p.document_id.as_str())
            .collect();
        documents.sort_unstable();
        documents.dedup();

        self.info.passage_count = self.passages.len() as u64;
        self.info.document_count = documents.len() as u64;
        self.info.updated_at = Utc::now();
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity; zero when either vector has zero magnitude
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, batch: &PassageBatch) -> Result<usize> {
        validate_batch(batch)?;

        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(&batch.collection_key) {
            check_pin(&existing.info, &batch.embedding_model, batch.dimension)?;
        }

        let collection = collections
            .entry(batch.collection_key.clone())
            .or_insert_with(|| {
                let now = Utc::now();
                Collection {
                    info: CollectionInfo {
                        collection_key: batch.collection_key.clone(),
                        embedding_model: batch.embedding_model.clone(),
                        dimension: batch.dimension,
                        passage_count: 0,
                        document_count: 0,
                        created_at: now,
                        updated_at: now,
                    },
                    passages: BTreeMap::new(),
                }
            });

        collection
            .passages
            .retain(|_, p| p.document_id != batch.document_id);
        for passage in &batch.passages {
            collection
                .passages
                .insert(passage.passage_id.clone(), passage.clone());
        }
        collection.refresh_counts();

        debug!(
            collection = %batch.collection_key,
            document = %batch.document_id,
            count = batch.passages.len(),
            "upserted passages in memory"
        );
        Ok(batch.passages.len())
    }

    async fn similarity_search(
        &self,
        collection_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        validate_k(k)?;

        let collections = self.collections.read().await;
        let Some(collection) = collections.get(collection_key) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievedPassage> = collection
            .passages
            .values()
            .map(|passage| RetrievedPassage {
                score: cosine_similarity(&passage.embedding, query_embedding),
                passage: passage.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.passage.document_id.cmp(&b.passage.document_id))
                .then_with(|| a.passage.sequence_index.cmp(&b.passage.sequence_index))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn collection(&self, collection_key: &str) -> Result<Option<CollectionInfo>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection_key).map(|c| c.info.clone()))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let collections = self.collections.read().await;
        let mut infos: Vec<CollectionInfo> = collections.values().map(|c| c.info.clone()).collect();
        infos.sort_by(|a, b| a.collection_key.cmp(&b.collection_key));
        Ok(infos)
    }

    async fn delete_collection(&self, collection_key: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections.remove(collection_key).is_some())
    }
}
