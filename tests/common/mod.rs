//! Offline test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use finagents::embeddings::Embedder;
use finagents::llm::GenerationRequest;
use finagents::llm::LanguageModel;
use finagents::store::InMemoryVectorStore;
use finagents::AgentModels;
use finagents::AgentTools;
use finagents::AppConfig;
use finagents::FinAgents;
use finagents::FinAgentsError;
use finagents::Result;
use sha2::Digest;
use sha2::Sha256;

pub const PHRASE: &str = "quarterly revenue rose 12%";

const FILLER: &str = "lorem ipsum dolor sit amet consectetur adipiscing elit sed eiusmod tempor ";

/// Deterministic bag-of-words embedder: each lowercase word adds one to a SHA-256 bucket
pub struct HashEmbedder {
    model: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(model: &str) -> Self {
        Self::with_dimension(model, 4096)
    }

    pub fn with_dimension(model: &str, dimension: usize) -> Self {
        Self {
            model: model.to_string(),
            dimension,
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(FinAgentsError::EmbeddingError(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Answers affirmatively only when the revenue passage is in the prompt
#[derive(Default)]
pub struct StubModel {
    pub calls: AtomicUsize,
}

impl StubModel {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.prompt.contains(PHRASE) {
            Ok(format!("Yes, revenue saw an increase: {PHRASE} [1]."))
        } else {
            Ok("The document does not cover this.".to_string())
        }
    }
}

/// Never answers within a test's patience
pub struct SlowModel;

#[async_trait]
impl LanguageModel for SlowModel {
    fn model_id(&self) -> &str {
        "slow-model"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

/// Small windows so a three-page document spans several passages
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ingest.chunk_size = 300;
    config.ingest.chunk_overlap = 50;
    config.retrieval.top_k = 3;
    config
}

pub fn app_with(
    config: AppConfig,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
) -> FinAgents {
    let tools = AgentTools::from_config(&config).unwrap();
    FinAgents::from_parts(
        config,
        Arc::new(InMemoryVectorStore::new()),
        embedder,
        AgentModels::shared(model),
        tools,
    )
    .unwrap()
}

/// Exactly `len` characters of filler text that trims to itself
pub fn filler(len: usize) -> String {
    let mut text: String = FILLER.chars().cycle().take(len).collect();
    if text.ends_with(' ') {
        text.pop();
        text.push('.');
    }
    text
}

/// Three 500-character pages; page 2 holds the revenue phrase well inside one window
pub fn quarterly_report_pages() -> Vec<String> {
    vec![
        filler(500),
        format!("{} {PHRASE} {}", filler(299), filler(173)),
        filler(500),
    ]
}

/// Form-feed separated pages, as plain-text documents mark them
pub fn as_document_text(pages: &[String]) -> String {
    pages.join("\u{000C}")
}

/// A real PDF with one Helvetica text line per `\n`-separated line of each page
pub fn pdf_document(pages: &[String]) -> Vec<u8> {
    let font_id = 3 + 2 * pages.len();
    let kids: Vec<String> = (0..pages.len())
        .map(|idx| format!("{} 0 R", 3 + 2 * idx))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
    ];
    for (idx, page) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
            4 + 2 * idx
        ));

        let mut content = String::from("BT /F1 10 Tf 14 TL 40 750 Td");
        for line in page.lines() {
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            content.push_str(&format!(" ({escaped}) Tj T*"));
        }
        content.push_str(" ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", idx + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

/// Three PDF pages of 70-character lines; only page 2 mentions revenue
pub fn quarterly_report_pdf_pages() -> Vec<String> {
    let lines = |count: usize| -> Vec<String> { (0..count).map(|_| filler(70)).collect() };
    let mut middle = lines(4);
    middle.push(PHRASE.to_string());
    middle.push(filler(70));
    vec![
        lines(5).join("\n"),
        middle.join("\n"),
        lines(5).join("\n"),
    ]
}
