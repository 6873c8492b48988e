//! Document ingestion: fetch, parse, chunk, embed, store
//!
//! ```text
//! URL ──► DocumentFetcher ──► parser ──► Chunker ──► Embedder ──► VectorStore
//!          (bytes, kind)      (pages)    (windows)   (vectors)    (one batch)
//! ```
//!
//! Every document is written as one [`PassageBatch`], so a failed ingestion
//! leaves the collection exactly as it was.

pub mod chunker;
pub mod fetch;
pub mod parser;

use std::sync::Arc;

pub use chunker::Chunk;
pub use chunker::Chunker;
use dashmap::DashMap;
pub use fetch::parse_document_url;
pub use fetch::ContentKind;
pub use fetch::DocumentFetcher;
pub use fetch::FetchedDocument;
pub use parser::ParsedDocument;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::models::IngestReport;
use crate::models::Passage;
use crate::models::PassageBatch;
use crate::store::check_pin;
use crate::store::VectorStore;

/// Longest accepted collection key
pub const MAX_COLLECTION_KEY_LEN: usize = 128;

/// Keys are 1-128 characters from `[A-Za-z0-9_.-]`
pub fn validate_collection_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(FinAgentsError::ValidationError(
            "Collection key must not be empty".to_string(),
        ));
    }
    if key.chars().count() > MAX_COLLECTION_KEY_LEN {
        return Err(FinAgentsError::ValidationError(format!(
            "Collection key is longer than {MAX_COLLECTION_KEY_LEN} characters"
        )));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(FinAgentsError::ValidationError(format!(
            "Collection key '{key}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

/// Derive a collection key from a document URL's file name
///
/// `https://example.com/pdf/Annual_Report_2024.pdf` becomes `annual_report_2024`.
#[must_use]
pub fn collection_key_from_url(raw: &str) -> String {
    let url = url::Url::parse(raw).ok();
    let stem = url
        .as_ref()
        .and_then(|u| u.path_segments())
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem).to_string())
        .or_else(|| url.as_ref().and_then(|u| u.host_str()).map(str::to_string))
        .unwrap_or_default();

    let key: String = stem
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_COLLECTION_KEY_LEN)
        .collect();

    if key.trim_matches('_').is_empty() {
        "document".to_string()
    } else {
        key
    }
}

pub struct DocumentIngestor {
    fetcher: DocumentFetcher,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    /// Serialises ingestion per collection key within this process
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DocumentIngestor {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher: DocumentFetcher::new(config)?,
            chunker: Chunker::from_config(config)?,
            embedder,
            store,
            locks: DashMap::new(),
        })
    }

    #[must_use]
    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Fetch a document and add its passages to a collection
    pub async fn ingest(&self, source_url: &str, collection_key: &str) -> Result<IngestReport> {
        validate_collection_key(collection_key)?;
        let url = parse_document_url(source_url)?;

        let fetched = self.fetcher.fetch(&url).await?;
        let document = tokio::task::spawn_blocking(move || parser::parse(&fetched))
            .await
            .map_err(|e| FinAgentsError::ParseError(format!("Parser task failed: {e}")))??;

        self.ingest_document(document, collection_key).await
    }

    /// Chunk, embed and store an already-parsed document
    pub async fn ingest_document(
        &self,
        document: ParsedDocument,
        collection_key: &str,
    ) -> Result<IngestReport> {
        validate_collection_key(collection_key)?;

        // Fail before embedding anything if the collection is pinned to another model
        if let Some(existing) = self.store.collection(collection_key).await? {
            check_pin(&existing, self.embedder.model(), self.embedder.dimension())?;
        }

        let chunks = self.chunker.chunk(&document.pages);
        if chunks.is_empty() {
            return Err(FinAgentsError::ParseError(format!(
                "No passages could be cut from {}",
                document.source_url
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(FinAgentsError::EmbeddingError(format!(
                "Embedder returned {} vectors for {} passages",
                embeddings.len(),
                chunks.len()
            )));
        }

        let passages = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Passage {
                passage_id: Passage::make_id(&document.document_id, chunk.sequence_index),
                collection_key: collection_key.to_string(),
                document_id: document.document_id.clone(),
                source_url: document.source_url.clone(),
                sequence_index: chunk.sequence_index,
                page: chunk.page,
                text: chunk.text,
                token_count: chunk.token_count,
                embedding,
            })
            .collect();

        let batch = PassageBatch {
            collection_key: collection_key.to_string(),
            embedding_model: self.embedder.model().to_string(),
            dimension: self.embedder.dimension(),
            document_id: document.document_id.clone(),
            source_url: document.source_url.clone(),
            passages,
        };

        let lock = self
            .locks
            .entry(collection_key.to_string())
            .or_default()
            .clone();
        let stored = {
            let _guard = lock.lock().await;
            self.store.upsert(&batch).await
        };
        drop(lock);
        // The map only keeps keys some other ingestion still holds
        self.locks
            .remove_if(collection_key, |_, lock| Arc::strong_count(lock) == 1);
        let passage_count = stored?;

        info!(
            "Ingested {} ({} pages) into '{}' as {} passages",
            document.source_url,
            document.page_count(),
            collection_key,
            passage_count
        );

        Ok(IngestReport {
            collection_key: collection_key.to_string(),
            document_id: document.document_id,
            source_url: document.source_url,
            page_count: document.pages.len(),
            passage_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::InMemoryVectorStore;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model(&self) -> &str {
            "length"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_collection_locks_are_released_after_ingest() {
        let store = Arc::new(InMemoryVectorStore::new());
        let ingestor =
            DocumentIngestor::new(&AppConfig::default(), Arc::new(LengthEmbedder), store).unwrap();

        let docs: Vec<ParsedDocument> = (0..6)
            .map(|i| {
                ParsedDocument::from_text(
                    format!("https://example.com/report-{i}.txt"),
                    &format!("Report {i}: quarterly revenue rose and margins held steady."),
                )
                .unwrap()
            })
            .collect();

        let results = futures::future::join_all(docs.into_iter().enumerate().map(|(i, doc)| {
            let key = if i % 2 == 0 { "shared" } else { "other" };
            ingestor.ingest_document(doc, key)
        }))
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert!(ingestor.locks.is_empty());
    }

    #[test]
    fn test_validate_collection_key() {
        assert!(validate_collection_key("apple_env-2024.v1").is_ok());
        assert!(matches!(
            validate_collection_key(""),
            Err(FinAgentsError::ValidationError(_))
        ));
        assert!(validate_collection_key("has space").is_err());
        assert!(validate_collection_key("semi;colon").is_err());
        assert!(validate_collection_key(&"k".repeat(129)).is_err());
        assert!(validate_collection_key(&"k".repeat(128)).is_ok());
    }

    #[test]
    fn test_collection_key_from_url() {
        assert_eq!(
            collection_key_from_url(
                "https://www.apple.com/environment/pdf/Apple_Environmental_Progress_Report_2024.pdf"
            ),
            "apple_environmental_progress_report_2024"
        );
        assert_eq!(
            collection_key_from_url("https://example.com/reports/q3%20results.pdf"),
            "q3_20results"
        );
        assert_eq!(collection_key_from_url("https://example.com/"), "example.com");
        assert_eq!(collection_key_from_url("garbage"), "document");
        assert!(validate_collection_key(&collection_key_from_url("https://example.com/a b.pdf")).is_ok());
    }
}
