//! Document ingestion over real HTTP from a local server

mod common;

use std::sync::Arc;

use axum::http::header;
use axum::routing::get;
use axum::Router;
use common::*;
use finagents::errors::ErrorKind;
use finagents::FinAgents;
use finagents::FinAgentsError;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn document_server() -> Router {
    let report = as_document_text(&quarterly_report_pages());
    let pdf = pdf_document(&quarterly_report_pdf_pages());
    Router::new()
        .route(
            "/q3-report.pdf",
            get(move || async move { ([(header::CONTENT_TYPE, "application/pdf")], pdf) }),
        )
        .route(
            "/q3-report.txt",
            get(move || async move { ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], report) }),
        )
        .route(
            "/notes.md",
            get(|| async { ([(header::CONTENT_TYPE, "text/markdown")], "# Notes\n\nMargins held steady.") }),
        )
        .route(
            "/chart.png",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    vec![0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
                )
            }),
        )
        .route(
            "/huge.txt",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "x".repeat(4096)) }),
        )
}

fn app() -> FinAgents {
    app_with(
        test_config(),
        Arc::new(HashEmbedder::new("hash")),
        Arc::new(StubModel::default()),
    )
}

#[tokio::test]
async fn test_ingest_text_document_then_answer() {
    let base = serve(document_server()).await;
    let app = app();

    let report = app
        .ingestor()
        .ingest(&format!("{base}/q3-report.txt"), "q3")
        .await
        .unwrap();
    assert_eq!(report.page_count, 3);
    assert_eq!(report.source_url, format!("{base}/q3-report.txt"));

    let answer = app.rag().answer("Did revenue increase?", "q3").await.unwrap();
    assert!(answer.sources[0].passage.text.contains(PHRASE));
}

#[tokio::test]
async fn test_ingest_pdf_keeps_page_numbers() {
    let base = serve(document_server()).await;
    let app = app();

    let report = app
        .ingestor()
        .ingest(&format!("{base}/q3-report.pdf"), "q3-pdf")
        .await
        .unwrap();
    assert_eq!(report.page_count, 3);
    assert!(report.passage_count > 1);

    let answer = app.rag().answer("Did revenue increase?", "q3-pdf").await.unwrap();
    let top = &answer.sources[0];
    assert!(top.passage.text.contains("revenue"));
    assert_eq!(top.passage.page, 2);
}

#[tokio::test]
async fn test_ingest_markdown() {
    let base = serve(document_server()).await;
    let report = app()
        .ingestor()
        .ingest(&format!("{base}/notes.md"), "notes")
        .await
        .unwrap();
    assert_eq!(report.passage_count, 1);
}

#[tokio::test]
async fn test_missing_document_is_fetch_error() {
    let base = serve(document_server()).await;
    let err = app()
        .ingestor()
        .ingest(&format!("{base}/missing.pdf"), "missing")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
}

#[tokio::test]
async fn test_unsupported_content_type_is_fetch_error() {
    let base = serve(document_server()).await;
    let err = app()
        .ingestor()
        .ingest(&format!("{base}/chart.png"), "chart")
        .await
        .unwrap_err();
    assert!(matches!(err, FinAgentsError::FetchError(ref msg) if msg.contains("Unsupported content type")));
}

#[tokio::test]
async fn test_oversized_document_is_fetch_error() {
    let base = serve(document_server()).await;
    let mut config = test_config();
    config.ingest.max_document_bytes = 1024;
    let app = app_with(
        config,
        Arc::new(HashEmbedder::new("hash")),
        Arc::new(StubModel::default()),
    );

    let err = app
        .ingestor()
        .ingest(&format!("{base}/huge.txt"), "huge")
        .await
        .unwrap_err();
    assert!(matches!(err, FinAgentsError::FetchError(_)));
}

#[tokio::test]
async fn test_non_http_url_is_validation_error() {
    let err = app()
        .ingestor()
        .ingest("ftp://example.com/report.pdf", "ftp")
        .await
        .unwrap_err();
    assert!(matches!(err, FinAgentsError::ValidationError(_)));
}

#[tokio::test]
async fn test_failed_ingest_leaves_no_collection() {
    let base = serve(document_server()).await;
    let app = app();
    let _ = app
        .ingestor()
        .ingest(&format!("{base}/chart.png"), "chart")
        .await;
    assert!(app.store().collection("chart").await.unwrap().is_none());
}
