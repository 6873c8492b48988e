//! API request handlers

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::api::types::*;
use crate::errors::FinAgentsError;
use crate::ingest::collection_key_from_url;
use crate::models::Answer;
use crate::models::CollectionInfo;
use crate::models::EvaluationReport;
use crate::models::IngestReport;
use crate::models::Report;
use crate::FinAgents;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<FinAgents>,
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Fetch, chunk, embed and store a document
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<IngestReport> {
    let collection = req
        .collection
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| collection_key_from_url(&req.url));
    info!("POST /api/documents: {} -> {}", req.url, collection);

    let report = state.app.ingestor().ingest(&req.url, &collection).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Answer a question from an ingested collection
pub async fn rag_answer(
    State(state): State<AppState>,
    Json(req): Json<RagAnswerRequest>,
) -> ApiResult<Answer> {
    info!("POST /api/rag/answer on '{}': {}", req.collection, req.question);

    let answer = state.app.rag().answer(&req.question, &req.collection).await?;
    Ok(Json(ApiResponse::success(answer)))
}

pub async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> ApiResult<Report> {
    info!("POST /api/research: {}", req.topic);

    let report = state.app.research().run(&req.topic).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn stock(
    State(state): State<AppState>,
    Json(req): Json<StockRequest>,
) -> ApiResult<Report> {
    info!("POST /api/stock: {} {:?}", req.query, req.tickers);

    let report = state.app.stock().analyze(&req.query, &req.tickers).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult<EvaluationReport> {
    info!("POST /api/evaluate: {}", req.query);

    let report = state
        .app
        .evaluator()
        .evaluate(&req.query, &req.response, &req.context)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Vec<CollectionInfo>> {
    let collections = state.app.store().list_collections().await?;
    Ok(Json(ApiResponse::success(collections)))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<DeleteCollectionResponse> {
    info!("DELETE /api/collections/{}", key);

    if !state.app.store().delete_collection(&key).await? {
        return Err(ApiError(FinAgentsError::NoContextError(format!(
            "Collection '{key}' does not exist"
        ))));
    }
    Ok(Json(ApiResponse::success(DeleteCollectionResponse {
        collection_key: key,
        deleted: true,
    })))
}
