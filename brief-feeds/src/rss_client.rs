//! RSS/Atom client for the curated news sources
//!
//! Fetches one feed at a time and normalizes entries into [`NewsItem`]s.
//! Cutoff filtering and near-duplicate collapsing across sources happen
//! downstream; this layer only enforces per-feed shape: title and link
//! required, titles capped at 160 chars. Entries with no parseable date
//! are kept, missing news is worse than an occasional stale item.

use chrono::{DateTime, Utc};
use reqwest::Client;

use brief_core::{link_id, FeedCategory, NewsItem};

use crate::error::FeedError;

/// Max title length carried into a digest
const TITLE_MAX_CHARS: usize = 160;

/// One upstream feed
#[derive(Debug, Clone)]
pub struct FeedSource {
    /// Name of the source
    pub name: String,
    /// RSS or Atom feed URL
    pub url: String,
    /// Digest section this feed contributes to
    pub category: FeedCategory,
}

impl FeedSource {
    pub fn new(name: &str, url: impl Into<String>, category: FeedCategory) -> Self {
        Self {
            name: name.to_string(),
            url: url.into(),
            category,
        }
    }
}

fn twitter_feed(rsshub_base: &str, handle: &str, category: FeedCategory) -> FeedSource {
    FeedSource::new(
        handle,
        format!("{rsshub_base}/twitter/user/{handle}?exclude_rts=1"),
        category,
    )
}

/// Geopolitics and conflict sources
pub fn osint_feeds(rsshub_base: &str) -> Vec<FeedSource> {
    let mut feeds: Vec<FeedSource> = [
        "zerohedge",
        "DeItaone",
        "spectatorindex",
        "SITREP_artorias",
        "ConflictAlarm",
        "sentdefender",
    ]
    .iter()
    .map(|h| twitter_feed(rsshub_base, h, FeedCategory::Osint))
    .collect();

    feeds.extend([
        FeedSource::new(
            "Long War Journal",
            "http://feeds.feedburner.com/LongWarJournal",
            FeedCategory::Osint,
        ),
        FeedSource::new(
            "The Diplomat",
            "https://thediplomat.com/feed/",
            FeedCategory::Osint,
        ),
        FeedSource::new(
            "Reuters World",
            "https://feeds.reuters.com/reuters/worldNews",
            FeedCategory::Osint,
        ),
        FeedSource::new(
            "BBC World",
            "https://feeds.bbci.co.uk/news/world/rss.xml",
            FeedCategory::Osint,
        ),
        FeedSource::new(
            "DW World",
            "https://rss.dw.com/rdf/rss-en-world",
            FeedCategory::Osint,
        ),
        FeedSource::new(
            "GDELT Conflict",
            "https://api.gdeltproject.org/api/v2/doc/doc?mode=artlist&format=rss&timespan=24h&query=(conflict+OR+military+OR+escalation+OR+protest+OR+strike+OR+geopolitics)",
            FeedCategory::Osint,
        ),
    ]);
    feeds
}

/// Markets and macro sources
pub fn market_feeds(rsshub_base: &str) -> Vec<FeedSource> {
    let mut feeds: Vec<FeedSource> = [
        "KobeissiLetter",
        "unusual_whales",
        "TheBlock__",
        "MacroAlf",
    ]
    .iter()
    .map(|h| twitter_feed(rsshub_base, h, FeedCategory::Market))
    .collect();

    feeds.extend([
        FeedSource::new(
            "Google News Macro",
            "https://news.google.com/rss/search?q=markets+macro+fed+rates+economy+earnings&hl=en-US&gl=US&ceid=US%3Aen",
            FeedCategory::Market,
        ),
        FeedSource::new(
            "Bloomberg Markets",
            "https://feeds.bloomberg.com/markets/news.rss",
            FeedCategory::Market,
        ),
        FeedSource::new(
            "Financial Times",
            "https://www.ft.com/?format=rss",
            FeedCategory::Market,
        ),
    ]);
    feeds
}

/// AI and tech sources
pub fn tech_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "a16z crypto",
            "https://a16zcrypto.com/feed",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "Simon Willison",
            "https://simonwillison.net/atom/everything/",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "MIT Technology Review",
            "https://www.technologyreview.com/feed/",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "Google News AI",
            "https://news.google.com/rss/search?q=artificial+intelligence+AI+tech+startups&hl=en-US&gl=US&ceid=US%3Aen",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "TechCrunch",
            "https://techcrunch.com/feed/",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "The Verge",
            "https://www.theverge.com/rss/index.xml",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "VentureBeat",
            "https://venturebeat.com/feed/",
            FeedCategory::Tech,
        ),
        FeedSource::new(
            "IEEE Spectrum",
            "https://spectrum.ieee.org/rss",
            FeedCategory::Tech,
        ),
    ]
}

/// Newsletter sources, surfaced by name in their own digest section and
/// never mixed into the news summaries
pub fn newsletter_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "The Daily Degen",
            "https://thedailydegen.substack.com/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Delphi Digital",
            "https://delphidigital.substack.com/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Arthur Hayes",
            "https://cryptohayes.medium.com/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Chamath",
            "https://chamath.substack.com/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Ben's Bites",
            "https://www.bensbites.co/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "The Batch (DL.AI)",
            "https://www.deeplearning.ai/the-batch/feed/",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Alpha Signal",
            "https://alphasignal.substack.com/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "TLDR AI",
            "https://tldr.tech/ai/feed",
            FeedCategory::Newsletter,
        ),
        FeedSource::new(
            "Bankless",
            "https://www.bankless.com/feed",
            FeedCategory::Newsletter,
        ),
    ]
}

/// RSS/Atom feed client
pub struct RssClient {
    client: Client,
}

impl RssClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Fetch and parse a single feed, trying RSS first, then Atom
    pub async fn fetch_feed(&self, source: &FeedSource) -> Result<Vec<NewsItem>, FeedError> {
        let response = self
            .client
            .get(&source.url)
            .header("User-Agent", "MorningBrief/1.0")
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::ApiError {
                status: response.status().as_u16(),
                message: format!("Failed to fetch {}", source.url),
            });
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        if let Ok(channel) = rss::Channel::read_from(&content[..]) {
            return Ok(parse_rss_channel(&channel, source));
        }

        if let Ok(atom_feed) = atom_syndication::Feed::read_from(&content[..]) {
            return Ok(parse_atom_feed(&atom_feed, source));
        }

        Err(FeedError::ParseError(format!(
            "Failed to parse feed: {}",
            source.url
        )))
    }
}

impl Default for RssClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_rss_channel(channel: &rss::Channel, source: &FeedSource) -> Vec<NewsItem> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            let link = item.link()?;
            if title.is_empty() || link.is_empty() {
                return None;
            }

            let published_at = item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|d| d.with_timezone(&Utc));

            Some(normalize_entry(title, link, published_at, source))
        })
        .collect()
}

fn parse_atom_feed(atom_feed: &atom_syndication::Feed, source: &FeedSource) -> Vec<NewsItem> {
    atom_feed
        .entries()
        .iter()
        .filter_map(|entry| {
            let title = entry.title().trim();
            let link = entry.links().first().map(|l| l.href())?;
            if title.is_empty() || link.is_empty() {
                return None;
            }

            let published_at = entry
                .published()
                .or_else(|| Some(entry.updated()))
                .map(|d| d.with_timezone(&Utc));

            Some(normalize_entry(title, link, published_at, source))
        })
        .collect()
}

fn normalize_entry(
    title: &str,
    link: &str,
    published_at: Option<DateTime<Utc>>,
    source: &FeedSource,
) -> NewsItem {
    let title: String = title.chars().take(TITLE_MAX_CHARS).collect();
    NewsItem {
        id: link_id(link),
        title,
        link: link.to_string(),
        published_at,
        category: source.category,
        source_name: Some(source.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FeedSource {
        FeedSource::new("Test", "https://example.com/feed", FeedCategory::Osint)
    }

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Test</title><link>https://example.com</link>
<description>t</description>
<item><title>First story</title><link>https://example.com/1</link>
<pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate></item>
<item><title></title><link>https://example.com/2</link></item>
<item><title>No link story</title></item>
<item><title>Undated story</title><link>https://example.com/3</link></item>
</channel></rss>"#;

    #[test]
    fn rss_entries_need_title_and_link() {
        let channel = rss::Channel::read_from(RSS_SAMPLE.as_bytes()).unwrap();
        let items = parse_rss_channel(&channel, &source());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First story");
        assert!(items[0].published_at.is_some());
        assert_eq!(items[1].title, "Undated story");
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn titles_are_capped() {
        let long = "x".repeat(400);
        let item = normalize_entry(&long, "https://example.com/long", None, &source());
        assert_eq!(item.title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn curated_lists_carry_their_category() {
        assert!(osint_feeds("https://rsshub.example")
            .iter()
            .all(|f| f.category == FeedCategory::Osint));
        assert!(newsletter_feeds()
            .iter()
            .all(|f| f.category == FeedCategory::Newsletter));
        let osint = osint_feeds("https://rsshub.example");
        assert!(osint[0].url.starts_with("https://rsshub.example/twitter/user/"));
    }
}
