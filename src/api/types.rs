//! API request and response types

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::warn;

use crate::errors::ErrorKind;
use crate::errors::FinAgentsError;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: Some(kind),
        }
    }
}

/// Error returned by handlers, rendered as an [`ApiResponse`] with a matching status
#[derive(Debug)]
pub struct ApiError(pub FinAgentsError);

impl From<FinAgentsError> for ApiError {
    fn from(error: FinAgentsError) -> Self {
        Self(error)
    }
}

/// HTTP status for each error kind
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NoContext => StatusCode::NOT_FOUND,
        ErrorKind::Fetch | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Store => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Parse
        | ErrorKind::Embedding
        | ErrorKind::Config
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!("Request failed ({}): {}", kind, self.0);
        } else {
            warn!("Request rejected ({}): {}", kind, self.0);
        }
        let body = ApiResponse::<()>::error(kind, self.0.to_string());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Ingest a document into a collection
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub url: String,
    /// Derived from the URL when omitted
    #[serde(default)]
    pub collection: Option<String>,
}

/// RAG question request
#[derive(Debug, Deserialize)]
pub struct RagAnswerRequest {
    pub question: String,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub query: String,
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub context: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteCollectionResponse {
    pub collection_key: String,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NoContext), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Fetch), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Generation), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::Store), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(ErrorKind::Embedding),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_carries_kind() {
        let body = ApiResponse::<()>::error(ErrorKind::NoContext, "empty collection");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "no_context");
        assert_eq!(json["data"], serde_json::Value::Null);
    }
}
