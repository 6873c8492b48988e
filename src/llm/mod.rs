//! Language model access
//!
//! [`LanguageModel`] is the seam every agent generates through.
//! [`LlmService`] implements it for OpenAI-compatible chat completion APIs
//! (Groq, OpenAI, local servers) and for Ollama.

pub mod client;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
pub use client::LlmProvider;
pub use client::LlmService;
pub use prompts::AgentPrompts;
pub use prompts::PromptTemplate;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::FinAgentsError;
use crate::errors::Result;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: usize = 2000;

/// A chat message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One completion call: system instruction, user prompt and an optional
/// declared output template
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub expected_output: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            expected_output: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = Some(expected_output.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// System instruction with the output template appended
    #[must_use]
    pub fn system_message(&self) -> String {
        match &self.expected_output {
            Some(expected) => format!(
                "{}\n\nProvide your output in the following format:\n<expected_output>\n{}\n</expected_output>",
                self.system.trim_end(),
                expected.trim()
            ),
            None => self.system.clone(),
        }
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_message()),
            ChatMessage::user(self.prompt.clone()),
        ]
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// One synchronous round trip; an empty completion is an error
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Generate with a hard deadline, whatever the provider's own timeouts are
pub async fn generate_with_deadline(
    model: &dyn LanguageModel,
    request: &GenerationRequest,
    deadline: Duration,
) -> Result<String> {
    tokio::time::timeout(deadline, model.generate(request))
        .await
        .map_err(|_| {
            FinAgentsError::timeout(
                format!("generation with {}", model.model_id()),
                deadline.as_secs(),
            )
        })?
}
