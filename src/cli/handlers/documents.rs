//! Document ingestion and question answering handlers

use tracing::info;

use crate::cli::output::print_evaluation;
use crate::cli::output::print_info;
use crate::cli::output::print_ingest_report;
use crate::cli::output::print_success;
use crate::ingest::collection_key_from_url;
use crate::FinAgents;
use crate::Result;

pub async fn handle_ingest(app: &FinAgents, url: &str, collection: &str) -> Result<()> {
    print_info(&format!("📥 Ingesting {url} into '{collection}'..."));

    let report = app.ingestor().ingest(url, collection).await?;

    print_success("Document ingested");
    print_ingest_report(&report);
    Ok(())
}

/// Answer a question from a collection, optionally scoring the answer
pub async fn handle_ask(
    app: &FinAgents,
    question: &str,
    collection: &str,
    evaluate: bool,
) -> Result<()> {
    print_info(&format!("🔍 Searching '{collection}'..."));

    let answer = app.rag().answer(question, collection).await?;
    println!("\n{}", answer.format());

    if evaluate {
        print_info("🧪 Evaluating answer...");
        let evaluation = app.evaluator().evaluate_answer(&answer).await?;
        println!();
        print_evaluation(&evaluation);
    }
    Ok(())
}

/// One-shot flow: ingest a document, then ask about it
pub async fn handle_rag(
    app: &FinAgents,
    pdf_url: &str,
    question: &str,
    collection: Option<&str>,
) -> Result<()> {
    let collection = collection.map_or_else(|| collection_key_from_url(pdf_url), str::to_string);
    info!("One-shot RAG on {} (collection '{}')", pdf_url, collection);

    handle_ingest(app, pdf_url, &collection).await?;
    println!();
    handle_ask(app, question, &collection, false).await
}
