//! Complete RAG pipeline: Embed -> Retrieve -> Assemble -> Generate

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::llm::generate_with_deadline;
use crate::llm::AgentPrompts;
use crate::llm::GenerationRequest;
use crate::llm::LanguageModel;
use crate::models::Answer;
use crate::rag::ContextAssembler;
use crate::rag::Retriever;
use crate::store::VectorStore;

/// Answer generation options
#[derive(Debug, Clone)]
pub struct RagOptions {
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout: Duration,
    pub max_context_chars: usize,
}

impl RagOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            timeout: config.llm_timeout(),
            max_context_chars: config.retrieval.max_context_chars,
        }
    }
}

/// Document question answering over one vector store
pub struct RagService {
    retriever: Retriever,
    context_assembler: ContextAssembler,
    model: Arc<dyn LanguageModel>,
    options: RagOptions,
}

impl RagService {
    /// Create from existing services
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        options: RagOptions,
    ) -> Self {
        Self {
            retriever: Retriever::new(store, embedder),
            context_assembler: ContextAssembler::new(options.max_context_chars),
            model,
            options,
        }
    }

    /// Answer a question from one collection's passages
    ///
    /// # Errors
    /// - `ValidationError` for an empty question
    /// - `NoContextError` when the collection is unknown, empty, or returns nothing
    /// - `EmbeddingMismatch` when the collection was embedded with another model
    /// - `GenerationError` / `TimeoutError` from the language model
    pub async fn answer(&self, question: &str, collection_key: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(FinAgentsError::ValidationError(
                "Question must not be empty".to_string(),
            ));
        }

        info!("Processing RAG query on '{}': {}", collection_key, question);

        // Step 1: Check the collection exists and matches the embedder
        self.retriever.pinned_collection(collection_key).await?;

        // Step 2: Retrieve relevant passages
        debug!("Step 2: Retrieving passages");
        let results = self
            .retriever
            .semantic_search(collection_key, question, self.options.top_k)
            .await?;
        if results.is_empty() {
            return Err(FinAgentsError::NoContextError(format!(
                "No passages retrieved from collection '{collection_key}'"
            )));
        }

        // Step 3: Assemble context
        debug!("Step 3: Assembling context");
        let assembled = self.context_assembler.assemble(&results);

        // Step 4: Generate answer using LLM
        debug!("Step 4: Generating answer with {}", self.model.model_id());
        let prompt = AgentPrompts::document_qa().render_with(&[
            ("context", assembled.context.trim_end()),
            ("question", question),
        ]);
        let request = GenerationRequest::new(AgentPrompts::document_qa_system(), prompt)
            .with_temperature(self.options.temperature)
            .with_max_tokens(self.options.max_tokens);

        let text =
            generate_with_deadline(self.model.as_ref(), &request, self.options.timeout).await?;

        info!(
            "RAG query completed with {} cited passages",
            assembled.used.len()
        );

        Ok(Answer {
            question: question.to_string(),
            collection_key: collection_key.to_string(),
            text,
            sources: assembled.used,
        })
    }
}
