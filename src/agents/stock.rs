//! Stock analysis agent

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::info;
use tracing::warn;

use super::AgentSettings;
use crate::errors::FinAgentsError;
use crate::errors::Result;
use crate::llm::generate_with_deadline;
use crate::llm::prompts::datetime_instruction;
use crate::llm::AgentPrompts;
use crate::llm::GenerationRequest;
use crate::llm::LanguageModel;
use crate::models::truncate_str;
use crate::models::Report;
use crate::models::Source;
use crate::tools::Fundamentals;
use crate::tools::MarketDataProvider;
use crate::tools::NewsItem;
use crate::tools::Quote;

pub const DEFAULT_NEWS_COUNT: usize = 5;
const MAX_TICKER_LEN: usize = 10;
const MAX_SUMMARY_CHARS: usize = 400;

/// Uppercase words that look like tickers but almost never are
const STOP_WORDS: &[&str] = &[
    "A", "AI", "AND", "API", "ATH", "BUY", "CEO", "CFO", "CPI", "CTO", "EBIT", "EPS", "ESG", "ETF",
    "EU", "FAQ", "FED", "FOR", "GDP", "HOLD", "I", "IPO", "IS", "IT", "LLC", "NEWS", "NYSE", "OK",
    "OR", "PE", "ROE", "ROI", "SEC", "SELL", "THE", "UK", "US", "USA", "USD", "VS", "YOY", "YTD",
];

/// Snapshot gathered for one symbol
enum Snapshot {
    Available {
        quote: Quote,
        fundamentals: Option<Fundamentals>,
        news: Vec<NewsItem>,
    },
    Unavailable { reason: String },
}

pub struct StockAnalysisAgent {
    model: Arc<dyn LanguageModel>,
    market: Arc<dyn MarketDataProvider>,
    news_count: usize,
    settings: AgentSettings,
}

impl StockAnalysisAgent {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        market: Arc<dyn MarketDataProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model,
            market,
            news_count: DEFAULT_NEWS_COUNT,
            settings,
        }
    }

    #[must_use]
    pub const fn with_news_count(mut self, news_count: usize) -> Self {
        self.news_count = news_count;
        self
    }

    /// Analyse the given tickers, or the ones named in the query
    ///
    /// # Errors
    /// - `ValidationError` for an empty query, a malformed ticker, or no ticker at all
    /// - `FetchError` when market data is unavailable for every ticker
    /// - `GenerationError` / `TimeoutError` from the language model
    pub async fn analyze(&self, query: &str, tickers: &[String]) -> Result<Report> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FinAgentsError::ValidationError(
                "Stock query must not be empty".to_string(),
            ));
        }

        let symbols = if tickers.is_empty() {
            extract_tickers(query)
        } else {
            normalize_tickers(tickers)?
        };
        if symbols.is_empty() {
            return Err(FinAgentsError::ValidationError(format!(
                "No ticker symbol found in '{query}'; pass one explicitly"
            )));
        }
        info!("Analyzing {}", symbols.join(", "));

        let snapshots = join_all(symbols.iter().map(|s| self.snapshot(s))).await;
        if snapshots
            .iter()
            .all(|s| matches!(s, Snapshot::Unavailable { .. }))
        {
            let reasons: Vec<String> = symbols
                .iter()
                .zip(&snapshots)
                .filter_map(|(symbol, snapshot)| match snapshot {
                    Snapshot::Unavailable { reason } => Some(format!("{symbol}: {reason}")),
                    Snapshot::Available { .. } => None,
                })
                .collect();
            return Err(FinAgentsError::FetchError(format!(
                "Market data unavailable for every ticker ({})",
                reasons.join("; ")
            )));
        }

        let mut market_data = String::new();
        let mut sources = Vec::new();
        for (symbol, snapshot) in symbols.iter().zip(&snapshots) {
            market_data.push_str(&format_snapshot(symbol, snapshot));
            market_data.push('\n');

            if let Snapshot::Available { news, .. } = snapshot {
                sources.push(Source::MarketData {
                    symbol: symbol.clone(),
                    url: self.market.quote_url(symbol),
                });
                sources.extend(news.iter().map(|item| Source::Web {
                    url: item.url.clone(),
                    title: item.title.clone(),
                }));
            }
        }

        let now = Utc::now();
        let system = format!(
            "{}\n\n{}",
            AgentPrompts::stock_instructions(),
            datetime_instruction(now)
        );
        let prompt = AgentPrompts::stock_analysis().render_with(&[
            ("query", query),
            ("market_data", market_data.trim_end()),
        ]);
        let request = self.settings.apply(GenerationRequest::new(system, prompt));

        let text =
            generate_with_deadline(self.model.as_ref(), &request, self.settings.timeout).await?;

        Ok(Report {
            query: query.to_string(),
            text,
            sources,
            generated_at: now,
        })
    }

    async fn snapshot(&self, symbol: &str) -> Snapshot {
        let (quote, fundamentals, news) = tokio::join!(
            self.market.quote(symbol),
            self.market.fundamentals(symbol),
            self.market.news(symbol, self.news_count)
        );

        match quote {
            Ok(quote) => {
                let fundamentals = fundamentals
                    .map_err(|e| warn!("No fundamentals for {}: {}", symbol, e))
                    .ok();
                let news = news.unwrap_or_else(|e| {
                    warn!("No headlines for {}: {}", symbol, e);
                    Vec::new()
                });
                Snapshot::Available {
                    quote,
                    fundamentals,
                    news,
                }
            }
            Err(e) => {
                warn!("No quote for {}: {}", symbol, e);
                Snapshot::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Ticker symbols named in free text, in order of appearance
///
/// Recognises `(AAPL)`-style mentions and standalone uppercase words of one to
/// five letters that are not common abbreviations.
#[must_use]
pub fn extract_tickers(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tickers = Vec::new();

    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(')') else {
            break;
        };
        let inner = after[..close].trim();
        if is_ticker_shaped(inner) && seen.insert(inner.to_string()) {
            tickers.push(inner.to_string());
        }
        rest = &after[close + 1..];
    }

    for word in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        if is_ticker_shaped(word) && !STOP_WORDS.contains(&word) && seen.insert(word.to_string()) {
            tickers.push(word.to_string());
        }
    }

    tickers
}

fn is_ticker_shaped(word: &str) -> bool {
    (1..=5).contains(&word.len()) && word.chars().all(|c| c.is_ascii_uppercase())
}

fn normalize_tickers(tickers: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for raw in tickers {
        let symbol = raw.trim().to_ascii_uppercase();
        let valid = !symbol.is_empty()
            && symbol.len() <= MAX_TICKER_LEN
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(FinAgentsError::ValidationError(format!(
                "Invalid ticker symbol '{raw}'"
            )));
        }
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}

fn format_snapshot(symbol: &str, snapshot: &Snapshot) -> String {
    let (quote, fundamentals, news) = match snapshot {
        Snapshot::Available {
            quote,
            fundamentals,
            news,
        } => (quote, fundamentals, news),
        Snapshot::Unavailable { reason } => {
            return format!("## {symbol}\nMarket data unavailable: {reason}\n");
        }
    };

    let currency = quote.currency.as_deref().unwrap_or("");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "## {} ({})",
        quote.symbol,
        quote.name.as_deref().unwrap_or(symbol)
    );
    if let Some(exchange) = &quote.exchange {
        let _ = writeln!(out, "Exchange: {exchange}");
    }
    let _ = writeln!(out, "Price: {:.2} {}", quote.price, currency);
    if let (Some(change), Some(pct)) = (quote.change(), quote.change_percent()) {
        let _ = writeln!(out, "Day change: {change:+.2} ({pct:+.2}%)");
    }
    if let (Some(high), Some(low)) = (quote.fifty_two_week_high, quote.fifty_two_week_low) {
        let _ = writeln!(out, "52-week range: {low:.2} - {high:.2}");
    }
    if let Some(as_of) = quote.as_of {
        let _ = writeln!(out, "As of: {}", as_of.format("%Y-%m-%d %H:%M UTC"));
    }

    match fundamentals {
        Some(fundamentals) => write_fundamentals(&mut out, fundamentals, currency),
        None => out.push_str("Fundamentals: unavailable\n"),
    }

    if news.is_empty() {
        out.push_str("Recent headlines: none available\n");
    } else {
        out.push_str("Recent headlines:\n");
        for item in news {
            let publisher = item.publisher.as_deref().unwrap_or("unknown");
            let _ = writeln!(out, "- {} ({}) {}", item.title, publisher, item.url);
        }
    }
    out
}

fn write_fundamentals(out: &mut String, f: &Fundamentals, currency: &str) {
    match (&f.sector, &f.industry) {
        (Some(sector), Some(industry)) => {
            let _ = writeln!(out, "Sector: {sector} / {industry}");
        }
        (Some(one), None) | (None, Some(one)) => {
            let _ = writeln!(out, "Sector: {one}");
        }
        (None, None) => {}
    }
    if let Some(cap) = f.market_cap {
        let _ = writeln!(out, "Market cap: {} {currency}", compact_number(cap));
    }
    for (label, value) in [
        ("P/E (trailing)", f.trailing_pe),
        ("P/E (forward)", f.forward_pe),
        ("EPS (trailing)", f.trailing_eps),
        ("EPS (forward)", f.forward_eps),
        ("Beta", f.beta),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value:.2}");
        }
    }
    for (label, ratio) in [
        ("Dividend yield", f.dividend_yield),
        ("Profit margin", f.profit_margin),
        ("Revenue growth (YoY)", f.revenue_growth),
    ] {
        if let Some(ratio) = ratio {
            let _ = writeln!(out, "{label}: {:.2}%", ratio * 100.0);
        }
    }

    if let Some(key) = &f.recommendation {
        let _ = write!(out, "Analyst consensus: {}", key.replace('_', " "));
        if let Some(count) = f.analyst_count {
            let _ = write!(out, " ({count} analysts)");
        }
        if let Some(target) = f.target_mean_price {
            let _ = write!(out, ", mean target {target:.2} {currency}");
        }
        out.push('\n');
    }
    if let Some(t) = &f.recommendation_trend {
        let _ = writeln!(
            out,
            "Analyst ratings: strong buy {}, buy {}, hold {}, sell {}, strong sell {}",
            t.strong_buy, t.buy, t.hold, t.sell, t.strong_sell
        );
    }
    if let Some(summary) = &f.business_summary {
        let _ = writeln!(out, "Business: {}", truncate_str(summary.trim(), MAX_SUMMARY_CHARS));
    }
}

/// 2950000000000 -> "2.95T"
fn compact_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    UNITS
        .iter()
        .find(|(scale, _)| value.abs() >= *scale)
        .map_or_else(
            || format!("{value:.2}"),
            |(scale, unit)| format!("{:.2}{unit}", value / scale),
        )
}
