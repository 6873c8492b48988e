//! RAG (Retrieval-Augmented Generation) module
//!
//! This module answers questions about ingested documents:
//! - Semantic retrieval using vector embeddings
//! - Citation-tagged context assembly from retrieved passages
//! - LLM-based answer generation bounded by a timeout
//!
//! # Examples
//!
//! ```rust,no_run
//! use finagents::config::AppConfig;
//! use finagents::FinAgents;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let app = FinAgents::connect(config).await?;
//!
//!     let answer = app.rag().answer("Did revenue increase?", "annual_report").await?;
//!     println!("Answer: {}", answer.text);
//!     println!("Sources: {} passages", answer.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod retriever;

pub use context::AssembledContext;
pub use context::ContextAssembler;
pub use pipeline::RagOptions;
pub use pipeline::RagService;
pub use retriever::Retriever;
