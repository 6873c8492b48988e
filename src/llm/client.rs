//! Chat completion clients

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::ChatMessage;
use super::GenerationRequest;
use super::LanguageModel;
use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// `/chat/completions` (Groq, OpenAI, vLLM, LM Studio)
    OpenAI,
    /// Ollama `/api/chat`
    Ollama,
}

impl LlmProvider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "openai" | "groq" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(FinAgentsError::ConfigError(format!(
                "Unknown LLM provider '{other}' (expected 'openai' or 'ollama')"
            ))),
        }
    }
}

/// Language model client bound to one model id
#[derive(Clone)]
pub struct LlmService {
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: Client,
}

impl LlmService {
    /// Create a client for `llm.model`
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = LlmProvider::parse(&config.llm.provider)?;
        let client = Client::builder()
            .timeout(config.llm_timeout())
            .build()
            .map_err(|e| FinAgentsError::HttpError(e.to_string()))?;

        let api_key = Some(config.llm.api_key.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        if provider == LlmProvider::OpenAI && api_key.is_none() {
            warn!("No LLM API key configured; set GROQ_API_KEY or llm.api_key");
        }

        Ok(Self {
            provider,
            endpoint: config.llm.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.llm.model.clone(),
            timeout: config.llm_timeout(),
            client,
        })
    }

    /// Same endpoint and credentials, different model id
    #[must_use]
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    async fn generate_openai(&self, request: &GenerationRequest) -> Result<String> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            max_tokens: usize,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions: model={}", self.model);

        let body = CompletionRequest {
            model: &self.model,
            messages: request.messages(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(&e))?;
        let response = check_status(response).await?;

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            FinAgentsError::GenerationError(format!("Malformed completion response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FinAgentsError::GenerationError("Completion has no content".to_string()))
    }

    async fn generate_ollama(&self, request: &GenerationRequest) -> Result<String> {
        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            num_predict: usize,
        }

        #[derive(Serialize)]
        struct OllamaChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            stream: bool,
            options: OllamaOptions,
        }

        #[derive(Deserialize)]
        struct OllamaChatResponse {
            message: ChatMessage,
        }

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat: model={}", self.model);

        let body = OllamaChatRequest {
            model: &self.model,
            messages: request.messages(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let response = check_status(response).await?;

        let chat: OllamaChatResponse = response.json().await.map_err(|e| {
            FinAgentsError::GenerationError(format!("Malformed Ollama response: {e}"))
        })?;
        Ok(chat.message.content)
    }

    fn transport_error(&self, error: &reqwest::Error) -> FinAgentsError {
        if error.is_timeout() {
            FinAgentsError::timeout(format!("generation with {}", self.model), self.timeout.as_secs())
        } else {
            FinAgentsError::GenerationError(format!("Language model unavailable: {error}"))
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let reason = if status == StatusCode::TOO_MANY_REQUESTS {
        "rate limited"
    } else {
        "request failed"
    };
    Err(FinAgentsError::GenerationError(format!(
        "Language model {reason} ({status}): {error_text}"
    )))
}

#[async_trait]
impl LanguageModel for LlmService {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let text = match self.provider {
            LlmProvider::OpenAI => self.generate_openai(request).await?,
            LlmProvider::Ollama => self.generate_ollama(request).await?,
        };

        if text.trim().is_empty() {
            return Err(FinAgentsError::GenerationError(format!(
                "Model {} returned an empty completion",
                self.model
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("Groq").unwrap(), LlmProvider::OpenAI);
        assert_eq!(LlmProvider::parse("ollama").unwrap(), LlmProvider::Ollama);
        assert!(matches!(
            LlmProvider::parse("bard"),
            Err(FinAgentsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_with_model_keeps_endpoint() {
        let mut config = AppConfig::default();
        config.llm.api_key = "key".to_string();
        let service = LlmService::new(&config).unwrap();
        let evaluator = service.with_model(config.evaluator_model());
        assert_eq!(service.model_id(), "llama3-70b-8192");
        assert_eq!(evaluator.model_id(), "llama-3.1-8b-instant");
        assert_eq!(evaluator.endpoint, service.endpoint);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_generation_error() {
        let mut config = AppConfig::default();
        config.llm.endpoint = "http://127.0.0.1:9/v1".to_string();
        let service = LlmService::new(&config).unwrap();
        let result = service.generate(&GenerationRequest::new("s", "p")).await;
        assert!(matches!(result, Err(FinAgentsError::GenerationError(_))));
    }
}
