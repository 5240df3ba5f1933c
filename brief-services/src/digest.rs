//! Digest builder
//!
//! Orchestrates one brief: news headlines fetched and deduplicated, the
//! model summarizes headline text only, and every structured block
//! (indicators, commodities, liquidations, calendar, sentiment,
//! newsletters) is assembled here and appended after the summary. Each
//! section degrades independently; a digest is always produced.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use brief_core::{NewsItem, ThresholdTable};
use brief_feeds::{
    market_feeds, newsletter_feeds, osint_feeds, tech_feeds, AcledClient, FeedSource,
    MarketDataClient, RssClient, COMMODITY_TICKERS, INDICATOR_TICKERS,
};
use brief_summarizer::{verbatim_fallback, Summarizer, SummaryMode};

use crate::aggregator::aggregate;
use crate::dedup::{dedup_titles, DEFAULT_SIMILARITY_THRESHOLD};
use crate::event_cache::EventCache;
use crate::last_brief::LastBriefStore;
use crate::resilient::{run_or, RetryPolicy};

/// Tunables for one digest build
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// RSSHub base URL for the twitter-backed feeds
    pub rsshub_base: String,
    /// Trailing window for news and liquidations
    pub window_hours: i64,
    /// Symbol groups displayed in the liquidation block
    pub top_k: usize,
    /// Significance thresholds for the liquidation block
    pub thresholds: ThresholdTable,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            rsshub_base: String::new(),
            window_hours: 12,
            top_k: 8,
            thresholds: ThresholdTable::default(),
        }
    }
}

/// Builds briefs and section snapshots on demand
pub struct DigestBuilder {
    config: DigestConfig,
    rss: RssClient,
    market: MarketDataClient,
    summarizer: Summarizer,
    acled: Option<tokio::sync::Mutex<AcledClient>>,
    cache: Arc<EventCache>,
    last_brief: LastBriefStore,
}

impl DigestBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: DigestConfig,
        rss: RssClient,
        market: MarketDataClient,
        summarizer: Summarizer,
        acled: Option<AcledClient>,
        cache: Arc<EventCache>,
        last_brief: LastBriefStore,
    ) -> Self {
        Self {
            config,
            rss,
            market,
            summarizer,
            acled: acled.map(tokio::sync::Mutex::new),
            cache,
            last_brief,
        }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - Duration::hours(self.config.window_hours)
    }

    /// Fetch a section's feeds, dropping entries older than `cutoff`
    ///
    /// Each feed runs through the feed-parse retry policy; a dead feed
    /// contributes an empty batch and the remaining feeds still produce
    /// a result.
    async fn fetch_section(
        &self,
        sources: &[FeedSource],
        max_per_feed: usize,
        cutoff: DateTime<Utc>,
    ) -> Vec<NewsItem> {
        let mut all_items = Vec::new();
        for source in sources {
            let items = run_or(RetryPolicy::feed_parse(), Vec::new(), || async {
                self.rss.fetch_feed(source).await.map_err(Into::into)
            })
            .await;
            all_items.extend(
                items
                    .into_iter()
                    .filter(|item| fresh_enough(item, cutoff))
                    .take(max_per_feed),
            );
        }
        all_items
    }

    /// Geopolitics headlines: curated feeds plus ACLED conflict events
    pub async fn osint_headlines(&self) -> String {
        let sources = osint_feeds(&self.config.rsshub_base);
        let raw = self.fetch_section(&sources, 8, self.cutoff()).await;
        let mut items = dedup_titles(raw, DEFAULT_SIMILARITY_THRESHOLD);
        items.truncate(35);

        if let Some(acled) = &self.acled {
            items.extend(acled.lock().await.fetch_events().await);
        }
        items.truncate(40);
        format_entries(&items, "- No major updates")
    }

    pub async fn market_headlines(&self) -> String {
        let sources = market_feeds(&self.config.rsshub_base);
        let raw = self.fetch_section(&sources, 10, self.cutoff()).await;
        let mut items = dedup_titles(raw, DEFAULT_SIMILARITY_THRESHOLD);
        items.truncate(20);
        format_entries(&items, "- No market news")
    }

    pub async fn tech_headlines(&self) -> String {
        let raw = self.fetch_section(&tech_feeds(), 10, self.cutoff()).await;
        let mut items = dedup_titles(raw, DEFAULT_SIMILARITY_THRESHOLD);
        items.truncate(20);
        format_entries(&items, "- No tech news")
    }

    /// Newsletter issues published since the last brief; undated entries
    /// are excluded here, a newsletter without a date is an archive page
    pub async fn newsletter_section(&self) -> String {
        let since = self.last_brief.read().max(self.cutoff());
        let items = self.fetch_section(&newsletter_feeds(), 5, since).await;
        let lines: Vec<String> = items
            .iter()
            .filter(|item| item.published_at.is_some())
            .map(|item| {
                let name = item.source_name.as_deref().unwrap_or("Newsletter");
                format!("- *{}* - [{}]({})", name, item.title, item.link)
            })
            .collect();
        if lines.is_empty() {
            "- No new newsletters since last brief.".to_string()
        } else {
            lines.join("\n")
        }
    }

    pub async fn indicators_block(&self) -> String {
        self.quote_block(INDICATOR_TICKERS).await
    }

    pub async fn commodities_block(&self) -> String {
        self.quote_block(COMMODITY_TICKERS).await
    }

    async fn quote_block(&self, tickers: &[(&str, &str)]) -> String {
        let mut lines = Vec::with_capacity(tickers.len());
        for (symbol, label) in tickers {
            let (price, change) = run_or(RetryPolicy::market_data(), (None, None), || async {
                Ok(self.market.quote(symbol).await)
            })
            .await;
            lines.push(quote_line(label, price, change));
        }
        lines.join("\n")
    }

    pub async fn sentiment_line(&self) -> String {
        match self.market.fear_greed().await {
            Some(fg) => fg.to_string(),
            None => "N/A".to_string(),
        }
    }

    pub async fn calendar_block(&self) -> String {
        let events = self.market.economic_calendar().await;
        if events.is_empty() {
            return "- Quiet day".to_string();
        }
        events
            .iter()
            .take(6)
            .map(|e| format!("- {} {} ({})", e.time, e.event, e.country))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Liquidation block from the live cache
    pub fn liquidation_block(&self) -> String {
        let window = Duration::hours(self.config.window_hours);
        let snapshot = self.cache.snapshot(Some(window));
        aggregate(
            &snapshot,
            window,
            &self.config.thresholds,
            self.config.top_k,
        )
        .to_string()
    }

    /// Summarize headline text with retries, falling back to the verbatim
    /// headlines when the model is unavailable
    pub async fn summarize(&self, raw: &str, mode: SummaryMode) -> String {
        run_or(RetryPolicy::summarize(), verbatim_fallback(raw), || async {
            self.summarizer.summarize(raw, mode).await
        })
        .await
    }

    /// Build the full brief and persist the build time
    pub async fn build_full(&self) -> String {
        info!("Building morning brief");

        let osint = self.osint_headlines().await;
        let mkt_news = self.market_headlines().await;
        let tech_news = self.tech_headlines().await;

        let news_raw = format!(
            "GEOPOLITICS HEADLINES:\n{osint}\n\nMARKET/MACRO HEADLINES:\n{mkt_news}\n\nAI/TECH HEADLINES:\n{tech_news}"
        );

        let indicators = self.indicators_block().await;
        let commodities = self.commodities_block().await;
        let liquidations = self.liquidation_block();
        let calendar = self.calendar_block().await;
        let sentiment = self.sentiment_line().await;
        let newsletters = self.newsletter_section().await;

        let news_summary = self.summarize(&news_raw, SummaryMode::Full).await;

        let date_str = Utc::now().format("%B %d, %Y %H:%M UTC");
        let message = format!(
            "*Morning Brief -- {date_str}*\n\n\
             {news_summary}\n\n\
             \u{1f4ca} *Key Indicators*\n{indicators}\n\n\
             \u{1f6e2} *Commodities & Vol*\n{commodities}\n\n\
             \u{1f4a5} *Hyperliquid Liquidations*\n{liquidations}\n\n\
             \u{1f4c5} *Economic Calendar*\n{calendar}\n\n\
             \u{1f628} *Sentiment:* {sentiment}\n\n\
             \u{1f4f0} *New Newsletters*\n{newsletters}"
        );

        if let Err(e) = self.last_brief.write(Utc::now()) {
            tracing::warn!("Failed to persist brief time: {}", e);
        }
        message
    }

    /// Section for /geo
    pub async fn build_geo(&self) -> String {
        let data = self.osint_headlines().await;
        let summary = self.summarize(&data, SummaryMode::Geo).await;
        format!(
            "\u{1f30d} *Geopolitics & Conflicts -- {}*\n\n{}",
            Utc::now().format("%H:%M UTC"),
            summary
        )
    }

    /// Section for /market
    pub async fn build_market(&self) -> String {
        let news = self.market_headlines().await;
        let summary = self.summarize(&news, SummaryMode::Market).await;
        let indicators = self.indicators_block().await;
        let commodities = self.commodities_block().await;
        let sentiment = self.sentiment_line().await;
        format!(
            "\u{1f4c8} *Markets & Macro -- {}*\n\n\
             {summary}\n\n\
             \u{1f4ca} *Key Indicators*\n{indicators}\n\n\
             \u{1f6e2} *Commodities & Vol*\n{commodities}\n\n\
             \u{1f628} *Sentiment:* {sentiment}",
            Utc::now().format("%H:%M UTC"),
        )
    }

    /// Section for /tech
    pub async fn build_tech(&self) -> String {
        let data = self.tech_headlines().await;
        let summary = self.summarize(&data, SummaryMode::Tech).await;
        format!(
            "\u{1f916} *AI & Tech -- {}*\n\n{}",
            Utc::now().format("%H:%M UTC"),
            summary
        )
    }

    /// Section for /liqs
    pub fn build_liqs(&self) -> String {
        format!(
            "\u{1f4a5} *Hyperliquid Snapshot -- {}*\n\n{}",
            Utc::now().format("%H:%M UTC"),
            self.liquidation_block()
        )
    }
}

/// Headline bullet list: "- title [link](url)", URLs always behind the link word
/// Undated entries pass, a missing date is not evidence of staleness
fn fresh_enough(item: &NewsItem, cutoff: DateTime<Utc>) -> bool {
    match item.published_at {
        Some(ts) => ts >= cutoff,
        None => true,
    }
}

fn format_entries(items: &[NewsItem], empty_placeholder: &str) -> String {
    if items.is_empty() {
        return empty_placeholder.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {} [link]({})", item.title, item.link))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_line(label: &str, price: Option<f64>, change: Option<f64>) -> String {
    match (price, change) {
        (Some(price), Some(change)) => {
            let emoji = if change > 0.0 {
                "\u{1f7e2}"
            } else {
                "\u{1f534}"
            };
            let sign = if change > 0.0 { "+" } else { "" };
            format!("- {label}: {price:.2} ({sign}{change:.1}%) {emoji}")
        }
        _ => format!("- {label}: N/A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::FeedCategory;

    fn item(title: &str, link: &str) -> NewsItem {
        NewsItem::new(title, link, None, FeedCategory::Osint)
    }

    #[test]
    fn entries_render_as_markdown_bullets() {
        let items = vec![
            item("First story", "https://e.com/1"),
            item("Second story", "https://e.com/2"),
        ];
        let text = format_entries(&items, "- nothing");
        assert_eq!(
            text,
            "- First story [link](https://e.com/1)\n- Second story [link](https://e.com/2)"
        );
    }

    #[test]
    fn empty_sections_get_their_placeholder() {
        assert_eq!(format_entries(&[], "- No market news"), "- No market news");
    }

    #[test]
    fn cutoff_keeps_undated_entries() {
        let cutoff = Utc::now() - Duration::hours(12);
        let fresh = NewsItem::new("fresh", "https://e.com/a", Some(Utc::now()), FeedCategory::Osint);
        let stale = NewsItem::new(
            "stale",
            "https://e.com/b",
            Some(Utc::now() - Duration::hours(36)),
            FeedCategory::Osint,
        );
        assert!(fresh_enough(&fresh, cutoff));
        assert!(!fresh_enough(&stale, cutoff));
        assert!(fresh_enough(&item("undated", "https://e.com/c"), cutoff));
    }

    #[tokio::test]
    async fn dead_feeds_contribute_nothing() {
        let builder = DigestBuilder::new(
            DigestConfig::default(),
            RssClient::new(),
            MarketDataClient::new(None),
            Summarizer::new("test-key"),
            None,
            Arc::new(EventCache::new(8)),
            LastBriefStore::new(std::env::temp_dir().join("brief-dead-feed-test.txt")),
        );
        let dead = vec![FeedSource::new(
            "Dead",
            "http://127.0.0.1:9/feed",
            FeedCategory::Osint,
        )];
        let items = builder
            .fetch_section(&dead, 5, Utc::now() - Duration::hours(12))
            .await;
        assert!(items.is_empty());
    }

    #[test]
    fn quote_lines_carry_direction() {
        assert_eq!(
            quote_line("BTC", Some(91_234.5), Some(3.21)),
            "- BTC: 91234.50 (+3.2%) \u{1f7e2}"
        );
        assert_eq!(
            quote_line("VIX", Some(15.0), Some(-1.25)),
            "- VIX: 15.00 (-1.2%) \u{1f534}"
        );
        assert_eq!(quote_line("Gold", None, None), "- Gold: N/A");
    }
}
