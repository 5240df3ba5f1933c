//! Core types for the Morning Brief digest engine
//!
//! This crate defines the shared data structures used across the brief
//! pipeline, including canonical liquidation events, news items, and
//! significance thresholds.

pub mod error;
pub mod event;
pub mod news;
pub mod thresholds;

pub use error::{BriefError, BriefResult};
pub use event::{CanonicalEvent, Side};
pub use news::{link_id, FeedCategory, NewsItem};
pub use thresholds::ThresholdTable;
