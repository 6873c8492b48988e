//! CLI output formatting utilities

use crate::models::CollectionInfo;
use crate::models::EvaluationReport;
use crate::models::GenerationResult;
use crate::models::IngestReport;
use crate::models::truncate_str;

/// Split a comma-separated context argument into trimmed, non-empty passages
#[must_use]
pub fn split_context(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn print_ingest_report(report: &IngestReport) {
    println!("📄 Source:      {}", report.source_url);
    println!("🗂️  Collection:  {}", report.collection_key);
    println!("🔑 Document id: {}", report.document_id);
    println!("📑 Pages:       {}", report.page_count);
    println!("🧩 Passages:    {}", report.passage_count);
}

/// Print any agent output followed by the sources it was built from
pub fn print_report(result: &GenerationResult) {
    println!("{}", result.text().trim());
    println!();
    let sources = result.sources();
    if sources.is_empty() {
        return;
    }
    println!("Sources:");
    for source in &sources {
        println!("  - {}", source.url());
    }
}

pub fn print_evaluation(evaluation: &EvaluationReport) {
    println!("{}", evaluation.report.trim());
    println!();

    let score = |s: Option<u8>| s.map_or_else(|| "-".to_string(), |v| v.to_string());
    let scores = &evaluation.scores;
    println!("📊 Parsed scores");
    println!("  Faithfulness:        {}", score(scores.faithfulness));
    println!("  Context relevance:   {}", score(scores.context_relevance));
    println!("  Answer completeness: {}", score(scores.answer_completeness));
    println!("  Source attribution:  {}", score(scores.source_attribution));
    println!("  Response coherence:  {}", score(scores.response_coherence));
    println!("  Overall:             {}/25", score(scores.overall));
}

pub fn print_collection_list(collections: &[CollectionInfo]) {
    if collections.is_empty() {
        print_info("No collections yet. Ingest a document with `finagents ingest <url> --collection <key>`");
        return;
    }
    println!("Found {} collections:", collections.len());
    println!(
        "  {:<32} {:<24} {:>9} {:>9}  {}",
        "KEY", "EMBEDDING", "DOCS", "PASSAGES", "UPDATED"
    );
    for info in collections {
        println!(
            "  {:<32} {:<24} {:>9} {:>9}  {}",
            truncate_str(&info.collection_key, 29),
            truncate_str(&info.embedding_label(), 21),
            info.document_count,
            info.passage_count,
            info.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    eprintln!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
