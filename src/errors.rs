use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinAgentsError {
    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No context available: {0}")]
    NoContextError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("{operation} timed out after {seconds}s")]
    TimeoutError { operation: String, seconds: u64 },

    #[error("Vector store error: {0}")]
    StoreError(String),

    #[error(
        "Collection '{collection}' was embedded with {expected}, but the active embedding model is {actual}"
    )]
    EmbeddingMismatch {
        collection: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration loading error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable discriminator for errors surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Fetch,
    Parse,
    Embedding,
    Validation,
    NoContext,
    Generation,
    Timeout,
    Store,
    Config,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Embedding => "embedding",
            Self::Validation => "validation",
            Self::NoContext => "no_context",
            Self::Generation => "generation",
            Self::Timeout => "timeout",
            Self::Store => "store",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FinAgentsError {
    /// Classify the error so callers can pick a corrective action
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FetchError(_) | Self::HttpError(_) => ErrorKind::Fetch,
            Self::ParseError(_) => ErrorKind::Parse,
            Self::EmbeddingError(_) | Self::EmbeddingMismatch { .. } => ErrorKind::Embedding,
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::NoContextError(_) => ErrorKind::NoContext,
            Self::GenerationError(_) => ErrorKind::Generation,
            Self::TimeoutError { .. } => ErrorKind::Timeout,
            Self::StoreError(_) | Self::Database(_) => ErrorKind::Store,
            Self::ConfigError(_) | Self::Settings(_) => ErrorKind::Config,
            Self::Serialization(_) | Self::TomlSerialization(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::TimeoutError {
            operation: operation.into(),
            seconds,
        }
    }
}

pub type Result<T> = std::result::Result<T, FinAgentsError>;
