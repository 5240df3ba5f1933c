//! Bot configuration from environment variables

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context};

use brief_core::ThresholdTable;

/// Which liquidation source feeds the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiqSource {
    /// WebSocket trades subscription (default)
    Websocket,
    /// REST polling fallback
    Rest,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub channel_id: String,
    pub groq_api_key: String,
    pub rsshub_base: String,
    pub finnhub_key: Option<String>,
    pub acled_email: Option<String>,
    pub acled_password: Option<String>,
    pub last_brief_path: PathBuf,
    pub cache_capacity: usize,
    pub liq_source: LiqSource,
    /// UTC hours at which the scheduled brief is sent
    pub brief_hours: Vec<u32>,
    pub thresholds: ThresholdTable,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let telegram_token =
            std::env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN is required")?;
        let channel_id = std::env::var("CHANNEL_ID").context("CHANNEL_ID is required")?;
        let groq_api_key = std::env::var("GROQ_API_KEY").context("GROQ_API_KEY is required")?;

        let rsshub_base = std::env::var("RSSHUB_URL")
            .unwrap_or_else(|_| "https://your-rsshub-url.railway.app".to_string());

        let cache_capacity = match optional("LIQ_CACHE_CAPACITY") {
            Some(raw) => raw
                .parse()
                .context("LIQ_CACHE_CAPACITY must be a positive integer")?,
            None => 500,
        };
        if cache_capacity == 0 {
            bail!("LIQ_CACHE_CAPACITY must be > 0");
        }

        let liq_source = match optional("LIQ_SOURCE").as_deref() {
            Some("rest") => LiqSource::Rest,
            Some("ws") | None => LiqSource::Websocket,
            Some(other) => bail!("LIQ_SOURCE must be 'ws' or 'rest', got '{other}'"),
        };

        let brief_hours = match optional("BRIEF_HOURS") {
            Some(raw) => parse_hours(&raw)?,
            None => vec![6, 19],
        };

        let thresholds = ThresholdTable::new(
            HashMap::from([
                ("BTC".to_string(), 200_000.0),
                ("ETH".to_string(), 200_000.0),
                ("SOL".to_string(), 100_000.0),
            ]),
            50_000.0,
            150_000.0,
        )
        .map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(Self {
            telegram_token,
            channel_id,
            groq_api_key,
            rsshub_base,
            finnhub_key: optional("FINNHUB_KEY"),
            acled_email: optional("ACLED_EMAIL"),
            acled_password: optional("ACLED_PASSWORD"),
            last_brief_path: optional("LAST_BRIEF_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("last_brief.txt")),
            cache_capacity,
            liq_source,
            brief_hours,
            thresholds,
        })
    }
}

fn parse_hours(raw: &str) -> anyhow::Result<Vec<u32>> {
    let mut hours = Vec::new();
    for part in raw.split(',') {
        let hour: u32 = part
            .trim()
            .parse()
            .with_context(|| format!("invalid hour '{part}' in BRIEF_HOURS"))?;
        if hour > 23 {
            bail!("hour {hour} in BRIEF_HOURS is out of range");
        }
        hours.push(hour);
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_parse_and_validate() {
        assert_eq!(parse_hours("6,19").unwrap(), vec![6, 19]);
        assert_eq!(parse_hours(" 0, 12 ,23").unwrap(), vec![0, 12, 23]);
        assert!(parse_hours("25").is_err());
        assert!(parse_hours("six").is_err());
    }
}
