//! Digest engine for the Morning Brief
//!
//! This crate turns the unbounded, out-of-order liquidation stream and the
//! periodically pulled news feeds into a small, consistent in-memory model
//! and assembles the final digest text from it.

pub mod aggregator;
pub mod dedup;
pub mod digest;
pub mod event_cache;
pub mod last_brief;
pub mod resilient;

pub use aggregator::{aggregate, fmt_usd, LiquidationDigest, SymbolGroup};
pub use dedup::{dedup_titles, similarity, DEFAULT_SIMILARITY_THRESHOLD};
pub use digest::{DigestBuilder, DigestConfig};
pub use event_cache::{CacheStats, EventCache};
pub use last_brief::LastBriefStore;
pub use resilient::{run_or, RetryPolicy};
