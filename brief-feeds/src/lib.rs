//! Event source adapters for the Morning Brief
//!
//! RSS/Atom news and newsletter feeds, Hyperliquid liquidation sources
//! (WebSocket push and REST poll), market data lookups, the push-account
//! poller and the ACLED conflict-event client. Adapters normalize upstream
//! shapes into `brief-core` types and stay best-effort throughout, a dead
//! source degrades its own section and nothing else.

pub mod acled;
pub mod error;
pub mod liquidations;
pub mod market_data;
pub mod push_poll;
pub mod rss_client;

pub use acled::AcledClient;
pub use error::FeedError;
pub use liquidations::{
    ConnState, LiquidationPoller, LiquidationStream, SeenSet, DEFAULT_COINS,
};
pub use market_data::{
    CalendarEvent, FearGreed, MarketDataClient, COMMODITY_TICKERS, INDICATOR_TICKERS,
};
pub use push_poll::{default_push_accounts, PushAccount, PushAlert, PushPoller};
pub use rss_client::{
    market_feeds, newsletter_feeds, osint_feeds, tech_feeds, FeedSource, RssClient,
};
