//! API route definitions

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Document ingestion and question answering
        .route("/documents", post(handlers::ingest_document))
        .route("/rag/answer", post(handlers::rag_answer))
        // Tool-backed agents
        .route("/research", post(handlers::research))
        .route("/stock", post(handlers::stock))
        .route("/evaluate", post(handlers::evaluate))
        // Collections
        .route("/collections", get(handlers::list_collections))
        .route("/collections/:key", delete(handlers::delete_collection))
        .with_state(state)
}
