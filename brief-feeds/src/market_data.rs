//! Market data client for the structured digest blocks
//!
//! Quotes, crypto sentiment and the economic calendar. Everything here is
//! best-effort: a failed lookup degrades to a sentinel and is logged, the
//! digest renders "N/A" in its place.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::FeedError;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const FEAR_GREED_URL: &str = "https://api.alternative.me/fng/";
const FINNHUB_CALENDAR_URL: &str = "https://finnhub.io/api/v1/calendar/economic";

/// Tickers for the key-indicators block, with display labels
pub const INDICATOR_TICKERS: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500"),
    ("^IXIC", "Nasdaq"),
    ("^DJI", "Dow"),
    ("NVDA", "NVDA"),
    ("TSLA", "TSLA"),
    ("AAPL", "AAPL"),
    ("BTC-USD", "BTC"),
    ("ETH-USD", "ETH"),
];

/// Tickers for the commodities-and-volatility block
pub const COMMODITY_TICKERS: &[(&str, &str)] = &[
    ("GC=F", "Gold"),
    ("CL=F", "Crude Oil"),
    ("NG=F", "Nat Gas"),
    ("^VIX", "VIX"),
];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    value_classification: String,
}

/// Crypto fear & greed reading
#[derive(Debug, Clone)]
pub struct FearGreed {
    pub value: String,
    pub classification: String,
}

impl std::fmt::Display for FearGreed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.classification, self.value)
    }
}

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    #[serde(rename = "economicCalendar", default)]
    economic_calendar: Vec<CalendarEvent>,
}

/// One scheduled economic release
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub time: String,
    pub event: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub impact: String,
}

/// Client for quotes, sentiment and calendar lookups
pub struct MarketDataClient {
    client: Client,
    finnhub_key: Option<String>,
}

impl MarketDataClient {
    pub fn new(finnhub_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(8))
                .build()
                .unwrap_or_else(|_| Client::new()),
            finnhub_key,
        }
    }

    /// Last price and 24h percent change; `(None, None)` on any failure
    pub async fn quote(&self, symbol: &str) -> (Option<f64>, Option<f64>) {
        match self.fetch_quote(symbol).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Quote failed [{}]: {}", symbol, e);
                (None, None)
            }
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<(Option<f64>, Option<f64>), FeedError> {
        let url = format!("{YAHOO_CHART_URL}/{symbol}?range=2d&interval=1d");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MorningBrief/1.0")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FeedError::ApiError {
                status: response.status().as_u16(),
                message: format!("chart {symbol}"),
            });
        }
        let body: ChartResponse = response.json().await?;
        let meta = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .map(|r| r.meta)
            .ok_or_else(|| FeedError::ParseError(format!("empty chart result for {symbol}")))?;

        let price = meta.regular_market_price;
        let change = match (meta.regular_market_price, meta.chart_previous_close) {
            (Some(last), Some(prev)) if prev != 0.0 => Some((last - prev) / prev * 100.0),
            _ => None,
        };
        Ok((price, change))
    }

    /// Crypto fear & greed index; None on failure
    pub async fn fear_greed(&self) -> Option<FearGreed> {
        let result: Result<FngResponse, FeedError> = async {
            let response = self.client.get(FEAR_GREED_URL).send().await?;
            Ok(response.json().await?)
        }
        .await;

        match result {
            Ok(body) => body.data.into_iter().next().map(|d| FearGreed {
                value: d.value,
                classification: d.value_classification,
            }),
            Err(e) => {
                warn!("Fear & Greed failed: {}", e);
                None
            }
        }
    }

    /// Today's high/medium-impact economic releases; empty on failure or
    /// when no API key is configured
    pub async fn economic_calendar(&self) -> Vec<CalendarEvent> {
        let Some(key) = &self.finnhub_key else {
            return Vec::new();
        };
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let result: Result<CalendarResponse, FeedError> = async {
            let response = self
                .client
                .get(FINNHUB_CALENDAR_URL)
                .query(&[
                    ("from", today.as_str()),
                    ("to", today.as_str()),
                    ("token", key.as_str()),
                ])
                .send()
                .await?;
            Ok(response.json().await?)
        }
        .await;

        match result {
            Ok(body) => body
                .economic_calendar
                .into_iter()
                .filter(|e| e.impact == "high" || e.impact == "medium")
                .collect(),
            Err(e) => {
                warn!("Economic calendar failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_response_yields_price_and_change() {
        let body = r#"{"chart":{"result":[{"meta":{
            "regularMarketPrice":110.0,"chartPreviousClose":100.0}}]}}"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        let meta = parsed.chart.result.unwrap().pop().unwrap().meta;
        assert_eq!(meta.regular_market_price, Some(110.0));
        assert_eq!(meta.chart_previous_close, Some(100.0));
    }

    #[test]
    fn calendar_filter_keeps_high_and_medium() {
        let body = r#"{"economicCalendar":[
            {"time":"08:30","event":"CPI","country":"US","impact":"high"},
            {"time":"10:00","event":"Something","country":"US","impact":"low"},
            {"time":"14:00","event":"FOMC Minutes","country":"US","impact":"medium"}
        ]}"#;
        let parsed: CalendarResponse = serde_json::from_str(body).unwrap();
        let kept: Vec<_> = parsed
            .economic_calendar
            .into_iter()
            .filter(|e| e.impact == "high" || e.impact == "medium")
            .collect();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].event, "CPI");
    }

    #[test]
    fn fear_greed_display() {
        let fg = FearGreed {
            value: "72".to_string(),
            classification: "Greed".to_string(),
        };
        assert_eq!(fg.to_string(), "Greed (72)");
    }
}
