//! External tools used by the research and stock analysis agents
//!
//! Each tool sits behind a trait so agents can be exercised offline:
//! - [`WebSearch`]: [`DuckDuckGoSearch`] over the Instant Answer JSON API
//! - [`ArticleScraper`]: [`ReadabilityScraper`] for main-content extraction
//! - [`MarketDataProvider`]: [`YahooFinance`] chart, quote summary and news endpoints

pub mod articles;
pub mod market;
pub mod search;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;

pub use articles::ReadabilityScraper;
pub use market::YahooFinance;
pub use search::DuckDuckGoSearch;

use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

/// One web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Main text of a web page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub text: String,
}

/// Latest price snapshot for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub as_of: Option<DateTime<Utc>>,
}

impl Quote {
    #[must_use]
    pub fn change(&self) -> Option<f64> {
        self.previous_close.map(|prev| self.price - prev)
    }

    #[must_use]
    pub fn change_percent(&self) -> Option<f64> {
        self.previous_close
            .filter(|prev| *prev != 0.0)
            .map(|prev| (self.price - prev) / prev * 100.0)
    }
}

/// Analyst rating counts for the current month
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationTrend {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// Valuation, profitability, analyst view and company profile for one symbol
///
/// Every figure is optional: providers omit what they do not cover.
/// Ratios (`dividend_yield`, `profit_margin`, `revenue_growth`) are fractions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub business_summary: Option<String>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub target_mean_price: Option<f64>,
    pub recommendation: Option<String>,
    pub analyst_count: Option<u32>,
    pub recommendation_trend: Option<RecommendationTrend>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

#[async_trait]
pub trait ArticleScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<Article>;
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>>;

    /// Human-readable page for the symbol, used for attribution
    fn quote_url(&self, symbol: &str) -> String;
}

/// HTTP client shared by the tools: configured timeout and user agent
pub(crate) fn http_client(config: &AppConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.tools_timeout())
        .user_agent(config.tools.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| FinAgentsError::HttpError(e.to_string()))
}

/// Map a transport failure to the error kind callers act on
pub(crate) fn transport_error(what: &str, timeout_secs: u64, error: &reqwest::Error) -> FinAgentsError {
    if error.is_timeout() {
        FinAgentsError::timeout(what, timeout_secs)
    } else {
        FinAgentsError::FetchError(format!("{what} failed: {error}"))
    }
}
