//! Poller for high-signal accounts that warrant instant alerts
//!
//! A small set of accounts is polled via RSSHub on a short cadence and new
//! posts are surfaced immediately instead of waiting for the next digest.
//! The first poll for an account only seeds the seen-ids so a restart never
//! floods the channel with old posts.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use brief_core::FeedCategory;

use crate::rss_client::{FeedSource, RssClient};

/// Max alert title length
const ALERT_TITLE_MAX: usize = 300;

/// Posts inspected per poll; anything older was either seen or missed for good
const ENTRIES_PER_POLL: usize = 5;

/// Accounts polled for push alerts
pub fn default_push_accounts() -> Vec<PushAccount> {
    vec![PushAccount {
        handle: "SITREP_artorias".to_string(),
        category: FeedCategory::Osint,
    }]
}

#[derive(Debug, Clone)]
pub struct PushAccount {
    pub handle: String,
    pub category: FeedCategory,
}

/// A new post from a push account
#[derive(Debug, Clone)]
pub struct PushAlert {
    pub handle: String,
    pub category: FeedCategory,
    pub title: String,
    pub link: String,
}

/// Tracks per-account seen ids across polls
pub struct PushPoller {
    rss: RssClient,
    rsshub_base: String,
    accounts: Vec<PushAccount>,
    seen: HashMap<String, HashSet<String>>,
}

impl PushPoller {
    pub fn new(rsshub_base: impl Into<String>, accounts: Vec<PushAccount>) -> Self {
        Self {
            rss: RssClient::new(),
            rsshub_base: rsshub_base.into(),
            accounts,
            seen: HashMap::new(),
        }
    }

    /// Poll every account once, returning alerts for unseen posts
    pub async fn poll(&mut self) -> Vec<PushAlert> {
        let mut alerts = Vec::new();
        for account in self.accounts.clone() {
            let source = FeedSource::new(
                &account.handle,
                format!(
                    "{}/twitter/user/{}?exclude_rts=1",
                    self.rsshub_base, account.handle
                ),
                account.category,
            );
            let items = match self.rss.fetch_feed(&source).await {
                Ok(items) => items,
                Err(e) => {
                    warn!("Push poll failed for @{}: {}", account.handle, e);
                    continue;
                }
            };

            let first_run = !self.seen.contains_key(&account.handle);
            let seen = self.seen.entry(account.handle.clone()).or_default();
            let mut fresh = Vec::new();
            for item in items.into_iter().take(ENTRIES_PER_POLL) {
                if seen.insert(item.id.clone()) {
                    fresh.push(item);
                }
            }

            if first_run {
                info!(
                    "Push poller: seeded {} ids for @{}",
                    seen.len(),
                    account.handle
                );
                continue;
            }

            for item in fresh {
                alerts.push(PushAlert {
                    handle: account.handle.clone(),
                    category: account.category,
                    title: item.title.chars().take(ALERT_TITLE_MAX).collect(),
                    link: item.link,
                });
            }
        }
        alerts
    }
}
