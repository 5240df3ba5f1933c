//! Canonical liquidation event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the position was liquidated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A normalized, source-agnostic liquidation event
///
/// Created by a source adapter on receipt of a raw message and never mutated
/// afterwards. `sequence_id` is the source-provided trade/event id used for
/// de-duplication; it is unique within one source feed only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Identifier of the feed that produced this event (e.g., "hyperliquid-ws")
    pub source_id: String,
    /// Instrument symbol (e.g., "BTC")
    pub symbol: String,
    /// Liquidation price as given by the source
    pub price: f64,
    /// Liquidated size in base units as given by the source
    pub size: f64,
    /// Side of the liquidated position
    pub side: Side,
    /// Source-provided id, unique per source feed
    pub sequence_id: String,
    /// When this event arrived at the cache
    pub observed_at: DateTime<Utc>,
}

impl CanonicalEvent {
    pub fn new(
        source_id: impl Into<String>,
        symbol: impl Into<String>,
        price: f64,
        size: f64,
        side: Side,
        sequence_id: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            symbol: symbol.into(),
            price,
            size,
            side,
            sequence_id: sequence_id.into(),
            observed_at: Utc::now(),
        }
    }

    /// Dollar-equivalent magnitude of the event, derived on demand so it can
    /// never go stale relative to price and size.
    pub fn notional(&self) -> f64 {
        self.price * self.size
    }
}
