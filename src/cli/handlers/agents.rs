//! Research, stock analysis and evaluation handlers

use crate::cli::output::print_evaluation;
use crate::cli::output::print_info;
use crate::cli::output::print_report;
use crate::cli::output::split_context;
use crate::models::GenerationResult;
use crate::FinAgents;
use crate::Result;

pub async fn handle_research(app: &FinAgents, topic: &str) -> Result<()> {
    print_info(&format!("🌐 Researching: {topic}"));

    let report = app.research().run(topic).await?;
    println!();
    print_report(&GenerationResult::Research(report));
    Ok(())
}

pub async fn handle_stock(app: &FinAgents, query: &str, tickers: &[String]) -> Result<()> {
    if tickers.is_empty() {
        print_info("📈 Analysing tickers named in the query...");
    } else {
        print_info(&format!("📈 Analysing {}...", tickers.join(", ")));
    }

    let report = app.stock().analyze(query, tickers).await?;
    println!();
    print_report(&GenerationResult::StockAnalysis(report));
    Ok(())
}

pub async fn handle_evaluate(
    app: &FinAgents,
    query: &str,
    response: &str,
    context_csv: &str,
) -> Result<()> {
    let context = split_context(context_csv);
    print_info(&format!(
        "🧪 Evaluating response against {} context passages...",
        context.len()
    ));

    let evaluation = app.evaluator().evaluate(query, response, &context).await?;
    println!();
    print_evaluation(&evaluation);
    Ok(())
}
