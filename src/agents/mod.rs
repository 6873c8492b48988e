//! Prompt-driven agents built on the language model and the external tools
//!
//! Each agent is an explicit client constructed once with its model, tools
//! and generation settings, then shared by reference:
//! - [`ResearchAgent`]: web search + article extraction -> financial report
//! - [`StockAnalysisAgent`]: market data + headlines -> analyst report
//! - [`RagEvaluator`]: scores a RAG answer against its context

pub mod evaluator;
pub mod research;
pub mod stock;

use std::time::Duration;

pub use evaluator::parse_scores;
pub use evaluator::RagEvaluator;
pub use research::ResearchAgent;
pub use stock::extract_tickers;
pub use stock::StockAnalysisAgent;

use crate::config::AppConfig;
use crate::llm::GenerationRequest;

/// Generation settings shared by the agents
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl AgentSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.llm_timeout(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }

    pub(crate) fn apply(&self, request: GenerationRequest) -> GenerationRequest {
        request
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            temperature: crate::llm::DEFAULT_TEMPERATURE,
            max_tokens: crate::llm::DEFAULT_MAX_TOKENS,
        }
    }
}
