//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::FinAgents;
use crate::Result;

/// Build the application router with all middleware layers
pub fn router(app: Arc<FinAgents>, enable_cors: bool) -> Router {
    let state = AppState { app };

    let mut router = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Start the API server
pub async fn serve_api(app: Arc<FinAgents>, host: &str, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting finagents API server...");

    let router = router(app, enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET    /api/health             - Health check");
    info!("  POST   /api/documents          - Ingest a document");
    info!("  POST   /api/rag/answer         - Answer from a collection");
    info!("  POST   /api/research           - Web research report");
    info!("  POST   /api/stock              - Stock analysis");
    info!("  POST   /api/evaluate           - Evaluate a RAG response");
    info!("  GET    /api/collections        - List collections");
    info!("  DELETE /api/collections/:key   - Delete a collection");

    axum::serve(listener, router).await?;

    Ok(())
}
