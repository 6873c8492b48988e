//! Embedding service against local provider stubs

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use finagents::embeddings::Embedder;
use finagents::embeddings::EmbeddingService;
use finagents::embeddings::MAX_BATCH_SIZE;
use finagents::AppConfig;
use finagents::FinAgentsError;
use serde_json::json;
use serde_json::Value;

const DIMENSION: usize = 8;

/// Stub vectors carry the input's trailing number in slot 0
fn vector_for(text: &str) -> Vec<f32> {
    let mut vector = vec![0.5; DIMENSION];
    vector[0] = text
        .rsplit(' ')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(-1.0);
    vector
}

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<AtomicUsize>,
    /// Drop the last vector of every response
    short: bool,
}

/// OpenAI-style batch endpoint answering in reverse order
async fn openai_embeddings(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    let inputs: Vec<String> = body["input"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();

    let mut data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(index, text)| json!({"index": index, "embedding": vector_for(text)}))
        .collect();
    if stub.short {
        data.pop();
    }
    Json(json!({"object": "list", "data": data}))
}

/// Ollama-style single endpoint whose latency varies per input
async fn ollama_embeddings(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["prompt"].as_str().unwrap().to_string();
    let n = vector_for(&prompt)[0] as u64;
    tokio::time::sleep(Duration::from_millis((7 - n % 7) * 3)).await;
    Json(json!({"embedding": vector_for(&prompt)}))
}

async fn serve(stub: Stub) -> String {
    let router = Router::new()
        .route("/embeddings", post(openai_embeddings))
        .route("/api/embeddings", post(ollama_embeddings))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn service(provider: &str, endpoint: String) -> EmbeddingService {
    let mut config = AppConfig::default();
    config.embeddings.provider = provider.to_string();
    config.embeddings.endpoint = endpoint;
    config.embeddings.model = "stub-embed".to_string();
    config.embeddings.dimension = DIMENSION;
    EmbeddingService::new(&config).unwrap()
}

fn passages(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("passage {i}")).collect()
}

fn assert_in_order(embeddings: &[Vec<f32>], count: usize) {
    assert_eq!(embeddings.len(), count);
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(embedding.len(), DIMENSION);
        assert_eq!(embedding[0], i as f32, "vector {i} out of place");
    }
}

#[tokio::test]
async fn test_openai_batches_keep_input_order() {
    let stub = Stub::default();
    let service = service("openai", serve(stub.clone()).await);

    let texts = passages(MAX_BATCH_SIZE + 57);
    let embeddings = service.embed_batch(&texts).await.unwrap();

    assert_in_order(&embeddings, texts.len());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_ollama_concurrent_requests_keep_input_order() {
    let stub = Stub::default();
    let service = service("ollama", serve(stub.clone()).await);

    let texts = passages(150);
    let embeddings = service.embed_batch(&texts).await.unwrap();

    assert_in_order(&embeddings, texts.len());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 150);

    let single = service.embed("passage 42").await.unwrap();
    assert_eq!(single[0], 42.0);
}

#[tokio::test]
async fn test_short_provider_response_is_embedding_error() {
    let stub = Stub {
        short: true,
        ..Stub::default()
    };
    let service = service("openai", serve(stub).await);

    let result = service.embed_batch(&passages(3)).await;
    assert!(matches!(result, Err(FinAgentsError::EmbeddingError(_))));
}

#[tokio::test]
async fn test_wrong_dimension_is_embedding_error() {
    let mut config = AppConfig::default();
    config.embeddings.provider = "ollama".to_string();
    config.embeddings.endpoint = serve(Stub::default()).await;
    config.embeddings.dimension = DIMENSION * 2;
    let service = EmbeddingService::new(&config).unwrap();

    let result = service.embed("passage 1").await;
    assert!(matches!(result, Err(FinAgentsError::EmbeddingError(msg)) if msg.contains("dimensions")));
}
