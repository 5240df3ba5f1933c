//! News data structures for the brief's headline sections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which section of the brief a feed belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCategory {
    /// Geopolitics / conflict news
    Osint,
    /// Markets and macro news
    Market,
    /// AI and tech news
    Tech,
    /// Newsletter issues, listed but never summarized
    Newsletter,
}

impl FeedCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedCategory::Osint => "osint",
            FeedCategory::Market => "market",
            FeedCategory::Tech => "tech",
            FeedCategory::Newsletter => "newsletter",
        }
    }
}

impl std::fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single headline pulled from a feed
///
/// Created transiently per digest build; not persisted across builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Stable identifier (hash of the link)
    pub id: String,
    /// Headline text
    pub title: String,
    /// Article URL
    pub link: String,
    /// Publication date, absent when the feed provides none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Section this item belongs to
    pub category: FeedCategory,
    /// Name of the originating feed (used for the newsletter section)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
        category: FeedCategory,
    ) -> Self {
        let link = link.into();
        Self {
            id: link_id(&link),
            title: title.into(),
            link,
            published_at,
            category,
            source_name: None,
        }
    }

    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// Stable short id derived from a link
pub fn link_id(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_id_is_stable_and_short() {
        let a = link_id("https://example.com/story");
        let b = link_id("https://example.com/story");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn different_links_get_different_ids() {
        assert_ne!(
            link_id("https://example.com/a"),
            link_id("https://example.com/b")
        );
    }
}
