use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::FinAgentsError;
use crate::errors::Result;

/// Prefix for environment overrides, e.g. `FINAGENTS_LLM__API_KEY`
pub const ENV_PREFIX: &str = "FINAGENTS";

/// Fallback variable for the hosted model key when none is configured
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://ai:ai@localhost:5532/ai".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// `ollama` or `openai` (any OpenAI-compatible `/embeddings` endpoint)
    pub provider: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    /// Concurrent requests for providers without native batching
    pub request_concurrency: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            model: "all-minilm".to_string(),
            dimension: 384,
            request_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Passage size in characters (~4 characters per token)
    pub chunk_size: usize,
    /// Characters shared by consecutive passages
    pub chunk_overlap: usize,
    pub fetch_timeout_secs: u64,
    pub max_document_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 300,
            fetch_timeout_secs: 30,
            max_document_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_context_chars: 12_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub enable_vector_indexes: bool,
    pub vector_index_lists: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enable_vector_indexes: true,
            vector_index_lists: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `openai` (OpenAI-compatible chat completions, e.g. Groq) or `ollama`
    pub provider: String,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: 60,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

fn default_llm_model() -> String {
    "llama3-70b-8192".to_string()
}

/// Per-agent model ids; unset agents use `llm.model`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub rag_model: Option<String>,
    pub research_model: Option<String>,
    pub stock_model: Option<String>,
    pub evaluator_model: Option<String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            rag_model: None,
            research_model: None,
            stock_model: None,
            evaluator_model: Some("llama-3.1-8b-instant".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub search_endpoint: String,
    pub max_search_results: usize,
    pub market_data_endpoint: String,
    pub news_count: usize,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Characters kept per scraped article
    pub max_article_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_endpoint: "https://api.duckduckgo.com".to_string(),
            max_search_results: 5,
            market_data_endpoint: "https://query1.finance.yahoo.com".to_string(),
            news_count: 5,
            http_timeout_secs: 20,
            user_agent: format!("finagents/{}", env!("CARGO_PKG_VERSION")),
            max_article_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
    pub performance: PerformanceConfig,
    pub llm: LlmConfig,
    pub agents: AgentsConfig,
    pub tools: ToolsConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, layered with `FINAGENTS_*` environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FinAgentsError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(environment_source())
            .build()?;

        Self::finish(settings.try_deserialize()?)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            tracing::warn!("No config file found, using defaults and environment overrides");
            let settings = config::Config::builder()
                .add_source(config::Config::try_from(&Self::default())?)
                .add_source(environment_source())
                .build()?;
            Self::finish(settings.try_deserialize()?)
        }
    }

    fn finish(mut config: Self) -> Result<Self> {
        if config.llm.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(GROQ_API_KEY_VAR) {
                config.llm.api_key = key;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(FinAgentsError::ConfigError(
                "ingest.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(FinAgentsError::ConfigError(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(FinAgentsError::ConfigError(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(FinAgentsError::ConfigError(
                "embeddings.dimension must be greater than zero".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0
            || self.ingest.fetch_timeout_secs == 0
            || self.tools.http_timeout_secs == 0
        {
            return Err(FinAgentsError::ConfigError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy of the configuration with secrets masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.llm.api_key.is_empty() {
            config.llm.api_key = "***".to_string();
        }
        if config.embeddings.api_key.is_some() {
            config.embeddings.api_key = Some("***".to_string());
        }
        let credentials = config
            .database
            .url
            .find("://")
            .zip(config.database.url.rfind('@'));
        if let Some((scheme_end, at)) = credentials {
            if scheme_end + 3 < at {
                config.database.url.replace_range(scheme_end + 3..at, "***");
            }
        }
        config
    }

    /// Render the redacted configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }

    /// Get database URL
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Get max connections for database pool
    pub fn max_connections(&self) -> u32 {
        self.database.max_connections
    }

    /// Get min connections for database pool
    pub fn min_connections(&self) -> u32 {
        self.database.min_connections
    }

    /// Get connection timeout in seconds
    pub fn connection_timeout(&self) -> u64 {
        self.database.connection_timeout
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Check if vector indexes are enabled
    pub fn vector_indexes_enabled(&self) -> bool {
        self.performance.enable_vector_indexes
    }

    /// Get vector index lists count
    pub fn vector_index_lists(&self) -> usize {
        self.performance.vector_index_lists
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.fetch_timeout_secs)
    }

    pub fn tools_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.http_timeout_secs)
    }

    /// Model id for the document QA agent
    pub fn rag_model(&self) -> &str {
        self.agents.rag_model.as_deref().unwrap_or(&self.llm.model)
    }

    /// Model id for the research agent
    pub fn research_model(&self) -> &str {
        self.agents
            .research_model
            .as_deref()
            .unwrap_or(&self.llm.model)
    }

    /// Model id for the stock analysis agent
    pub fn stock_model(&self) -> &str {
        self.agents.stock_model.as_deref().unwrap_or(&self.llm.model)
    }

    /// Model id for the evaluation agent
    pub fn evaluator_model(&self) -> &str {
        self.agents
            .evaluator_model
            .as_deref()
            .unwrap_or(&self.llm.model)
    }
}

fn environment_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
