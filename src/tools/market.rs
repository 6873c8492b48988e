//! Yahoo Finance quotes, fundamentals and headlines

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http_client;
use super::transport_error;
use super::Fundamentals;
use super::MarketDataProvider;
use super::NewsItem;
use super::Quote;
use super::RecommendationTrend;
use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

const QUOTE_PAGE: &str = "https://finance.yahoo.com/quote";
const SUMMARY_MODULES: &str =
    "summaryDetail,defaultKeyStatistics,financialData,recommendationTrend,assetProfile";

pub struct YahooFinance {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    full_exchange_name: Option<String>,
    exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    previous_close: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    summary_detail: SummaryDetail,
    default_key_statistics: KeyStatistics,
    financial_data: FinancialData,
    recommendation_trend: TrendModule,
    asset_profile: AssetProfile,
}

/// Numeric field as `{"raw": 1.5, "fmt": "1.50"}`, or `{}` when missing
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    forward_eps: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    target_mean_price: Option<RawValue>,
    recommendation_key: Option<String>,
    number_of_analyst_opinions: Option<RawValue>,
    profit_margins: Option<RawValue>,
    revenue_growth: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrendModule {
    trend: Vec<TrendPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrendPeriod {
    period: String,
    strong_buy: u32,
    buy: u32,
    hold: u32,
    sell: u32,
    strong_sell: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    long_business_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    news: Vec<RawNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    title: String,
    link: String,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
}

impl YahooFinance {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config
                .tools
                .market_data_endpoint
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: config.tools.http_timeout_secs,
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinance {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let url = format!("{}/v8/finance/chart/{}", self.endpoint, symbol);
        debug!("Fetching quote: {}", symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "1y"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| transport_error(&format!("quote for {symbol}"), self.timeout_secs, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&format!("quote for {symbol}"), self.timeout_secs, &e))?;

        // Unknown symbols come back as 404 with an error body
        let envelope: ChartEnvelope = serde_json::from_str(&body).map_err(|e| {
            FinAgentsError::FetchError(format!(
                "Malformed quote response for {symbol} (HTTP {status}): {e}"
            ))
        })?;

        parse_chart(symbol, envelope)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.endpoint, symbol);
        debug!("Fetching fundamentals: {}", symbol);

        let what = format!("fundamentals for {symbol}");
        let response = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .await
            .map_err(|e| transport_error(&what, self.timeout_secs, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&what, self.timeout_secs, &e))?;

        let envelope: SummaryEnvelope = serde_json::from_str(&body).map_err(|e| {
            FinAgentsError::FetchError(format!(
                "Malformed fundamentals response for {symbol} (HTTP {status}): {e}"
            ))
        })?;

        parse_summary(symbol, envelope)
    }

    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v1/finance/search", self.endpoint);
        let news_count = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", symbol),
                ("newsCount", news_count.as_str()),
                ("quotesCount", "0"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(&format!("news for {symbol}"), self.timeout_secs, &e))?;

        if !response.status().is_success() {
            return Err(FinAgentsError::FetchError(format!(
                "News search for {symbol} failed: {}",
                response.status()
            )));
        }

        let envelope: SearchEnvelope = response.json().await.map_err(|e| {
            FinAgentsError::FetchError(format!("Malformed news response for {symbol}: {e}"))
        })?;

        Ok(envelope
            .news
            .into_iter()
            .take(limit)
            .map(|raw| NewsItem {
                title: raw.title,
                url: raw.link,
                publisher: raw.publisher,
                published_at: raw
                    .provider_publish_time
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            })
            .collect())
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{QUOTE_PAGE}/{symbol}")
    }
}

fn parse_chart(symbol: &str, envelope: ChartEnvelope) -> Result<Quote> {
    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| {
            let reason = envelope
                .chart
                .error
                .and_then(|e| e.description)
                .unwrap_or_else(|| "no data".to_string());
            FinAgentsError::FetchError(format!("No market data for {symbol}: {reason}"))
        })?;

    let closes: Vec<f64> = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close.into_iter().flatten().collect())
        .unwrap_or_default();

    let meta = result.meta;
    let price = meta
        .regular_market_price
        .or_else(|| closes.last().copied())
        .ok_or_else(|| FinAgentsError::FetchError(format!("No price for {symbol}")))?;

    let previous_close = meta
        .previous_close
        .or_else(|| closes.len().checked_sub(2).map(|idx| closes[idx]));
    let high = meta
        .fifty_two_week_high
        .or_else(|| closes.iter().copied().reduce(f64::max));
    let low = meta
        .fifty_two_week_low
        .or_else(|| closes.iter().copied().reduce(f64::min));

    Ok(Quote {
        symbol: meta.symbol,
        name: meta.long_name.or(meta.short_name),
        currency: meta.currency,
        exchange: meta.full_exchange_name.or(meta.exchange_name),
        price,
        previous_close,
        fifty_two_week_high: high,
        fifty_two_week_low: low,
        as_of: meta
            .regular_market_time
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
    })
}

fn parse_summary(symbol: &str, envelope: SummaryEnvelope) -> Result<Fundamentals> {
    let result = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| {
            let reason = envelope
                .quote_summary
                .error
                .and_then(|e| e.description)
                .unwrap_or_else(|| "no data".to_string());
            FinAgentsError::FetchError(format!("No fundamentals for {symbol}: {reason}"))
        })?;

    let detail = result.summary_detail;
    let stats = result.default_key_statistics;
    let financial = result.financial_data;
    let profile = result.asset_profile;

    // "0m" is the current month; older periods follow it
    let recommendation_trend = result
        .recommendation_trend
        .trend
        .into_iter()
        .find(|p| p.period == "0m")
        .map(|p| RecommendationTrend {
            strong_buy: p.strong_buy,
            buy: p.buy,
            hold: p.hold,
            sell: p.sell,
            strong_sell: p.strong_sell,
        })
        .filter(|t| t.total() > 0);

    Ok(Fundamentals {
        symbol: symbol.to_string(),
        sector: profile.sector.filter(|s| !s.is_empty()),
        industry: profile.industry.filter(|s| !s.is_empty()),
        business_summary: profile.long_business_summary.filter(|s| !s.trim().is_empty()),
        market_cap: raw(detail.market_cap),
        trailing_pe: raw(detail.trailing_pe),
        forward_pe: raw(detail.forward_pe),
        trailing_eps: raw(stats.trailing_eps),
        forward_eps: raw(stats.forward_eps),
        dividend_yield: raw(detail.dividend_yield),
        beta: raw(detail.beta),
        profit_margin: raw(financial.profit_margins),
        revenue_growth: raw(financial.revenue_growth),
        target_mean_price: raw(financial.target_mean_price),
        recommendation: financial
            .recommendation_key
            .filter(|key| !key.is_empty() && key != "none"),
        analyst_count: raw(financial.number_of_analyst_opinions)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u32),
        recommendation_trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_with_meta() {
        let body = r#"{"chart":{"result":[{"meta":{
            "symbol":"AAPL","currency":"USD","fullExchangeName":"NasdaqGS",
            "longName":"Apple Inc.","regularMarketPrice":189.5,"regularMarketTime":1714766400,
            "fiftyTwoWeekHigh":199.62,"fiftyTwoWeekLow":164.08},
            "indicators":{"quote":[{"close":[180.0,null,185.0,187.0]}]}}],"error":null}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        let quote = parse_chart("AAPL", envelope).unwrap();

        assert_eq!(quote.name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.exchange.as_deref(), Some("NasdaqGS"));
        assert_eq!(quote.price, 189.5);
        assert_eq!(quote.previous_close, Some(185.0));
        assert_eq!(quote.fifty_two_week_high, Some(199.62));
        assert!(quote.as_of.is_some());
    }

    #[test]
    fn test_parse_chart_falls_back_to_series() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"MSFT"},
            "indicators":{"quote":[{"close":[400.0,410.0,null,405.0]}]}}],"error":null}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        let quote = parse_chart("MSFT", envelope).unwrap();

        assert_eq!(quote.price, 405.0);
        assert_eq!(quote.previous_close, Some(410.0));
        assert_eq!(quote.fifty_two_week_high, Some(410.0));
        assert_eq!(quote.fifty_two_week_low, Some(400.0));
    }

    #[test]
    fn test_unknown_symbol_is_fetch_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        let err = parse_chart("ZZZZ", envelope).unwrap_err();
        assert!(matches!(err, FinAgentsError::FetchError(ref msg) if msg.contains("delisted")));
    }

    #[test]
    fn test_parse_summary_modules() {
        let body = r#"{"quoteSummary":{"result":[{
            "summaryDetail":{"marketCap":{"raw":2950000000000,"fmt":"2.95T"},
                "trailingPE":{"raw":29.5,"fmt":"29.50"},"forwardPE":{"raw":27.1,"fmt":"27.10"},
                "dividendYield":{"raw":0.0052,"fmt":"0.52%"},"beta":{}},
            "defaultKeyStatistics":{"trailingEps":{"raw":6.43,"fmt":"6.43"},"forwardEps":{}},
            "financialData":{"targetMeanPrice":{"raw":210.5,"fmt":"210.50"},
                "recommendationKey":"buy","numberOfAnalystOpinions":{"raw":40,"fmt":"40"},
                "profitMargins":{"raw":0.2531},"revenueGrowth":{"raw":0.0487}},
            "recommendationTrend":{"trend":[
                {"period":"0m","strongBuy":10,"buy":22,"hold":8,"sell":1,"strongSell":0},
                {"period":"-1m","strongBuy":9,"buy":21,"hold":9,"sell":1,"strongSell":0}]},
            "assetProfile":{"sector":"Technology","industry":"Consumer Electronics",
                "longBusinessSummary":"Designs phones and computers."}}],"error":null}}"#;
        let envelope: SummaryEnvelope = serde_json::from_str(body).unwrap();
        let fundamentals = parse_summary("AAPL", envelope).unwrap();

        assert_eq!(fundamentals.market_cap, Some(2.95e12));
        assert_eq!(fundamentals.trailing_pe, Some(29.5));
        assert_eq!(fundamentals.trailing_eps, Some(6.43));
        assert_eq!(fundamentals.forward_eps, None);
        assert_eq!(fundamentals.beta, None);
        assert_eq!(fundamentals.recommendation.as_deref(), Some("buy"));
        assert_eq!(fundamentals.analyst_count, Some(40));
        assert_eq!(fundamentals.recommendation_trend.unwrap().strong_buy, 10);
        assert_eq!(fundamentals.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn test_parse_summary_with_missing_modules() {
        let body = r#"{"quoteSummary":{"result":[{
            "summaryDetail":{"marketCap":{"raw":1200000000}},
            "financialData":{"recommendationKey":"none"},
            "recommendationTrend":{"trend":[]}}],"error":null}}"#;
        let envelope: SummaryEnvelope = serde_json::from_str(body).unwrap();
        let fundamentals = parse_summary("SPY", envelope).unwrap();

        assert_eq!(fundamentals.market_cap, Some(1.2e9));
        assert_eq!(fundamentals.recommendation, None);
        assert_eq!(fundamentals.recommendation_trend, None);
        assert_eq!(fundamentals.sector, None);
    }

    #[test]
    fn test_summary_for_unknown_symbol_is_fetch_error() {
        let body = r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for ticker symbol: ZZZZ"}}}"#;
        let envelope: SummaryEnvelope = serde_json::from_str(body).unwrap();
        let err = parse_summary("ZZZZ", envelope).unwrap_err();
        assert!(matches!(err, FinAgentsError::FetchError(ref msg) if msg.contains("Quote not found")));
    }
}
