use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use committee_models::config::QuoteConfig;
use committee_models::{QuoteSnapshot, NO_NEWS_HEADLINE};
use reqwest::{StatusCode, Url};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QuoteError;
use crate::provider::QuoteProvider;

/// Roughly three months of daily bars, the window for average volume.
const AVG_VOLUME_BARS: usize = 63;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) committee/0.1";

/// Quote provider backed by the public Yahoo Finance endpoints.
///
/// One snapshot needs up to three requests: the chart (required), news search
/// and quote summary (both best effort).
pub struct YahooProvider {
    client: reqwest::Client,
    config: QuoteConfig,
}

impl YahooProvider {
    pub fn new(config: QuoteConfig) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<Option<ChartQuote>, QuoteError> {
        let url = symbol_url(&self.config.chart_url, symbol)?;
        let response = self
            .client
            .get(url)
            .query(&[("range", "1y"), ("interval", "1d")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QuoteError::DataProvider(format!(
                "chart request for {symbol} failed ({status}): {body}"
            )));
        }

        let body: Value = response.json().await?;
        parse_chart(symbol, &body)
    }

    async fn fetch_headlines(&self, symbol: &str) -> Vec<String> {
        let count = self.config.headline_limit.to_string();
        let result: Result<Value, reqwest::Error> = async {
            let response = self
                .client
                .get(&self.config.search_url)
                .query(&[
                    ("q", symbol),
                    ("quotesCount", "0"),
                    ("newsCount", count.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        match result {
            Ok(body) => parse_headlines(&body, self.config.headline_limit),
            Err(e) => {
                warn!(symbol, error = %e, "News search failed");
                Vec::new()
            }
        }
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        let url = match symbol_url(&self.config.summary_url, symbol) {
            Ok(url) => url,
            Err(e) => {
                debug!(symbol, error = %e, "Quote summary unavailable");
                return Fundamentals::default();
            }
        };
        let result: Result<Value, reqwest::Error> = async {
            let response = self
                .client
                .get(url)
                .query(&[("modules", "summaryDetail")])
                .send()
                .await?
                .error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        match result {
            Ok(body) => parse_fundamentals(&body),
            Err(e) => {
                debug!(symbol, error = %e, "Quote summary unavailable");
                Fundamentals::default()
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn lookup(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, QuoteError> {
        let Some(chart) = self.fetch_chart(symbol).await? else {
            debug!(symbol, "Yahoo has no chart for symbol");
            return Ok(None);
        };

        let (mut headlines, fundamentals) = tokio::join!(
            self.fetch_headlines(&chart.symbol),
            self.fetch_fundamentals(&chart.symbol)
        );
        if headlines.is_empty() {
            headlines.push(NO_NEWS_HEADLINE.to_string());
        }

        Ok(Some(QuoteSnapshot {
            ticker: chart.symbol,
            price: chart.price,
            pe_ratio: fundamentals.pe_ratio,
            week52_high: chart.week52_high,
            week52_low: chart.week52_low,
            market_cap: fundamentals.market_cap,
            volume: chart.volume,
            avg_volume: chart.avg_volume,
            headlines,
            fetched_at: Utc::now(),
        }))
    }
}

/// `base` with `symbol` appended as one escaped path segment.
pub fn symbol_url(base: &str, symbol: &str) -> Result<Url, QuoteError> {
    let mut url = Url::parse(base)
        .map_err(|e| QuoteError::DataProvider(format!("invalid endpoint {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| QuoteError::DataProvider(format!("endpoint {base} cannot take a path")))?
        .pop_if_empty()
        .push(symbol);
    Ok(url)
}

/// The parts of a snapshot that come from the chart endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartQuote {
    pub symbol: String,
    pub price: Decimal,
    pub week52_high: Decimal,
    pub week52_low: Decimal,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub pe_ratio: Option<Decimal>,
    pub market_cap: Option<Decimal>,
}

/// Parse a v8 chart response.
///
/// A chart-level error or a result without a market price means the symbol is
/// unknown. The 52-week range comes from the metadata when present, otherwise
/// from the daily highs and lows of the one-year series.
pub fn parse_chart(requested: &str, body: &Value) -> Result<Option<ChartQuote>, QuoteError> {
    let chart = body
        .get("chart")
        .ok_or_else(|| QuoteError::DataProvider("chart response missing 'chart'".to_string()))?;

    if chart.get("error").is_some_and(|e| !e.is_null()) {
        return Ok(None);
    }

    let Some(result) = chart
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
    else {
        return Ok(None);
    };

    let meta = &result["meta"];
    let Some(price) = decimal_field(meta, "regularMarketPrice").filter(|p| !p.is_zero()) else {
        return Ok(None);
    };

    let series = &result["indicators"]["quote"][0];
    let highs = number_series(&series["high"]);
    let lows = number_series(&series["low"]);

    let week52_high = decimal_field(meta, "fiftyTwoWeekHigh")
        .or_else(|| highs.iter().copied().max())
        .ok_or_else(|| QuoteError::DataProvider(format!("no 52-week high for {requested}")))?;
    let week52_low = decimal_field(meta, "fiftyTwoWeekLow")
        .or_else(|| lows.iter().copied().min())
        .ok_or_else(|| QuoteError::DataProvider(format!("no 52-week low for {requested}")))?;

    let volumes: Vec<u64> = series["volume"]
        .as_array()
        .map(|v| v.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    let recent = &volumes[volumes.len().saturating_sub(AVG_VOLUME_BARS)..];
    let avg_volume = if recent.is_empty() {
        None
    } else {
        Some(recent.iter().sum::<u64>() / recent.len() as u64)
    };

    let symbol = meta["symbol"]
        .as_str()
        .unwrap_or(requested)
        .to_ascii_uppercase();

    Ok(Some(ChartQuote {
        symbol,
        price,
        week52_high,
        week52_low,
        volume: meta["regularMarketVolume"].as_u64(),
        avg_volume,
    }))
}

/// Titles from a v1 search response, capped at `limit`.
pub fn parse_headlines(body: &Value, limit: usize) -> Vec<String> {
    body.get("news")
        .and_then(Value::as_array)
        .map(|news| {
            news.iter()
                .filter_map(|article| {
                    article
                        .get("title")
                        .or_else(|| article.get("content").and_then(|c| c.get("title")))
                        .and_then(Value::as_str)
                })
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .take(limit)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Trailing P/E (forward P/E as fallback) and market cap from a quote summary.
pub fn parse_fundamentals(body: &Value) -> Fundamentals {
    let detail = &body["quoteSummary"]["result"][0]["summaryDetail"];
    let raw = |field: &str| decimal_field(&detail[field], "raw").filter(|v| !v.is_zero());

    Fundamentals {
        pe_ratio: raw("trailingPE").or_else(|| raw("forwardPE")),
        market_cap: raw("marketCap"),
    }
}

fn decimal_field(obj: &Value, field: &str) -> Option<Decimal> {
    obj.get(field)
        .and_then(Value::as_f64)
        .and_then(Decimal::from_f64)
        .map(|d| d.round_dp(4))
}

fn number_series(values: &Value) -> Vec<Decimal> {
    values
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_f64)
                .filter_map(Decimal::from_f64)
                .map(|d| d.round_dp(4))
                .collect()
        })
        .unwrap_or_default()
}
