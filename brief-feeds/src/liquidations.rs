//! Hyperliquid liquidation sources
//!
//! Two adapters over the same normalization path: a WebSocket trades
//! subscription for push delivery and a REST poller as fallback. Both emit
//! [`CanonicalEvent`]s on an mpsc channel; the consumer owns the cache.
//! Trade ids repeat across reconnects and poll cycles, so both adapters
//! de-duplicate by `tid` against a bounded seen-set.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use brief_core::{CanonicalEvent, Side};

/// Hyperliquid WebSocket URL
const HL_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

/// Hyperliquid info endpoint (REST)
const HL_INFO_URL: &str = "https://api.hyperliquid.xyz/info";

/// Reconnect delay base
const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);

/// Cap on the exponential reconnect delay
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Seen-set high water mark; trimmed down to half when hit
const SEEN_CAP: usize = 2000;

/// REST poll cadence, and the shorter retry sleep after an errored cycle
const POLL_INTERVAL: Duration = Duration::from_secs(120);
const POLL_ERROR_INTERVAL: Duration = Duration::from_secs(30);

/// Coins watched for liquidations
pub const DEFAULT_COINS: &[&str] = &[
    "BTC", "ETH", "SOL", "XRP", "HYPE", "WIF", "DOGE", "AVAX", "ARB", "SUI", "BNB", "LINK", "ADA",
];

/// Connection lifecycle of the WebSocket adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Connected,
    Backoff { attempt: u32 },
}

fn backoff_delay(attempt: u32) -> Duration {
    let delay = RECONNECT_DELAY_BASE * 2u32.pow(attempt.saturating_sub(1).min(16));
    delay.min(MAX_RECONNECT_DELAY)
}

/// Failed connect or dropped session, bump the attempt counter
fn reconnect_state(attempt: &mut u32) -> ConnState {
    *attempt += 1;
    ConnState::Backoff { attempt: *attempt }
}

/// Raw trade as delivered by Hyperliquid
#[derive(Debug, Clone, Deserialize)]
pub struct HlTrade {
    pub coin: String,
    pub px: String,
    pub sz: String,
    #[serde(default)]
    pub dir: String,
    pub tid: u64,
}

/// WebSocket envelope
#[derive(Debug, Deserialize)]
struct WsEnvelope {
    channel: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Keep only liquidation trades and map them onto the canonical shape
///
/// `dir` reads like "Liquidated Long" / "Liquidated Short"; a liquidated
/// long position is a Long-side event. Unparseable prices and sizes drop
/// the trade.
fn normalize(trade: &HlTrade, source_id: &str) -> Option<CanonicalEvent> {
    if !trade.dir.contains("Liquidated") {
        return None;
    }
    let price: f64 = trade.px.parse().ok()?;
    let size: f64 = trade.sz.parse().ok()?;
    let side = if trade.dir.contains("Long") {
        Side::Long
    } else {
        Side::Short
    };
    Some(CanonicalEvent::new(
        source_id,
        &trade.coin,
        price,
        size,
        side,
        trade.tid.to_string(),
    ))
}

/// Insertion-ordered seen-set with a trim-to-half bound
#[derive(Debug, Default)]
pub struct SeenSet {
    order: VecDeque<String>,
    set: HashSet<String>,
    cap: usize,
}

impl SeenSet {
    pub fn new(cap: usize) -> Self {
        Self {
            order: VecDeque::new(),
            set: HashSet::new(),
            cap,
        }
    }

    /// Record an id, returning true when it was not seen before
    pub fn insert(&mut self, id: &str) -> bool {
        if self.set.contains(id) {
            return false;
        }
        self.set.insert(id.to_string());
        self.order.push_back(id.to_string());
        if self.order.len() > self.cap {
            while self.order.len() > self.cap / 2 {
                if let Some(old) = self.order.pop_front() {
                    self.set.remove(&old);
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Push-based liquidation source over the Hyperliquid trades channel
pub struct LiquidationStream {
    coins: Vec<String>,
    events_tx: mpsc::Sender<CanonicalEvent>,
}

impl LiquidationStream {
    pub fn new(coins: Vec<String>, events_tx: mpsc::Sender<CanonicalEvent>) -> Self {
        Self { coins, events_tx }
    }

    /// Run until the event receiver is dropped
    ///
    /// Explicit state machine: Connecting on start and after each backoff,
    /// Connected while the session lives, Backoff with a capped exponential
    /// delay after any connect failure or dropped session.
    pub async fn run(self) {
        let mut seen = SeenSet::new(SEEN_CAP);
        let mut attempt = 0u32;
        let mut state = ConnState::Connecting;
        let mut live: Option<WsStream> = None;

        loop {
            state = match state {
                ConnState::Connecting => {
                    info!("[HL WS] Connecting to {}", HL_WS_URL);
                    match connect_async(HL_WS_URL).await {
                        Ok((ws_stream, _)) => {
                            info!("[HL WS] Connected");
                            attempt = 0;
                            live = Some(ws_stream);
                            ConnState::Connected
                        }
                        Err(e) => {
                            error!("[HL WS] Connection failed: {}", e);
                            reconnect_state(&mut attempt)
                        }
                    }
                }
                ConnState::Connected => match live.take() {
                    Some(ws_stream) => {
                        if self.session(ws_stream, &mut seen).await.is_err() {
                            // receiver gone, nobody left to feed
                            return;
                        }
                        reconnect_state(&mut attempt)
                    }
                    None => ConnState::Connecting,
                },
                ConnState::Backoff { attempt } => {
                    let delay = backoff_delay(attempt);
                    info!("[HL WS] Reconnecting in {:?} (attempt {})", delay, attempt);
                    tokio::time::sleep(delay).await;
                    ConnState::Connecting
                }
            };
        }
    }

    /// One connected session; Err means the downstream receiver was dropped
    async fn session(&self, ws_stream: WsStream, seen: &mut SeenSet) -> Result<(), ()> {
        let (mut write, mut read) = ws_stream.split();

        for coin in &self.coins {
            let sub = json!({
                "method": "subscribe",
                "subscription": { "type": "trades", "coin": coin },
            });
            if let Err(e) = write.send(Message::Text(sub.to_string().into())).await {
                warn!("[HL WS] Failed to subscribe {}: {}", coin, e);
                return Ok(());
            }
        }

        // Hyperliquid drops idle connections after 60s
        let mut heartbeat = interval(Duration::from_secs(30));

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            for event in parse_ws_trades(&text, seen) {
                                if self.events_tx.send(event).await.is_err() {
                                    return Err(());
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                warn!("[HL WS] Failed to send pong: {}", e);
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("[HL WS] Connection closed by server");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            error!("[HL WS] Error: {}", e);
                            return Ok(());
                        }
                        None => {
                            info!("[HL WS] Stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                _ = heartbeat.tick() => {
                    let ping = json!({ "method": "ping" });
                    if let Err(e) = write.send(Message::Text(ping.to_string().into())).await {
                        warn!("[HL WS] Failed to send ping: {}", e);
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Parse one WebSocket frame into new liquidation events
fn parse_ws_trades(text: &str, seen: &mut SeenSet) -> Vec<CanonicalEvent> {
    let envelope: WsEnvelope = match serde_json::from_str(text) {
        Ok(env) => env,
        Err(e) => {
            debug!("[HL WS] Unparseable frame: {}", e);
            return Vec::new();
        }
    };
    if envelope.channel != "trades" {
        return Vec::new();
    }
    let trades: Vec<HlTrade> = match serde_json::from_value(envelope.data) {
        Ok(trades) => trades,
        Err(e) => {
            debug!("[HL WS] Unparseable trades payload: {}", e);
            return Vec::new();
        }
    };
    trades
        .iter()
        .filter_map(|t| normalize(t, "hyperliquid-ws"))
        .filter(|ev| seen.insert(&ev.sequence_id))
        .collect()
}

/// REST fallback: polls recent trades per coin on a fixed cadence
pub struct LiquidationPoller {
    client: Client,
    coins: Vec<String>,
    events_tx: mpsc::Sender<CanonicalEvent>,
}

impl LiquidationPoller {
    pub fn new(coins: Vec<String>, events_tx: mpsc::Sender<CanonicalEvent>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            coins,
            events_tx,
        }
    }

    /// Run until the event receiver is dropped
    pub async fn run(self) {
        let mut seen = SeenSet::new(SEEN_CAP);
        loop {
            let mut cycle_failed = false;
            for coin in &self.coins {
                match self.fetch_coin(coin).await {
                    Ok(trades) => {
                        for event in trades
                            .iter()
                            .filter_map(|t| normalize(t, "hyperliquid-rest"))
                            .filter(|ev| seen.insert(&ev.sequence_id))
                        {
                            if self.events_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("[HL poll] {} failed: {}", coin, e);
                        cycle_failed = true;
                    }
                }
            }
            let sleep = if cycle_failed {
                POLL_ERROR_INTERVAL
            } else {
                POLL_INTERVAL
            };
            tokio::time::sleep(sleep).await;
        }
    }

    async fn fetch_coin(&self, coin: &str) -> Result<Vec<HlTrade>, crate::error::FeedError> {
        let response = self
            .client
            .post(HL_INFO_URL)
            .json(&json!({ "type": "recentTrades", "coin": coin }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(crate::error::FeedError::ApiError {
                status: response.status().as_u16(),
                message: format!("recentTrades {coin}"),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(coin: &str, px: &str, sz: &str, dir: &str, tid: u64) -> HlTrade {
        HlTrade {
            coin: coin.to_string(),
            px: px.to_string(),
            sz: sz.to_string(),
            dir: dir.to_string(),
            tid,
        }
    }

    #[test]
    fn liquidated_long_maps_to_long_side() {
        let ev = normalize(&trade("BTC", "90000", "0.5", "Liquidated Long", 1), "t").unwrap();
        assert_eq!(ev.side, Side::Long);
        assert_eq!(ev.symbol, "BTC");
        assert_eq!(ev.notional(), 45_000.0);
        assert_eq!(ev.sequence_id, "1");
    }

    #[test]
    fn liquidated_short_maps_to_short_side() {
        let ev = normalize(&trade("ETH", "3000", "10", "Liquidated Short", 2), "t").unwrap();
        assert_eq!(ev.side, Side::Short);
    }

    #[test]
    fn plain_trades_are_not_events() {
        assert!(normalize(&trade("BTC", "90000", "0.5", "Open Long", 3), "t").is_none());
        assert!(normalize(&trade("BTC", "90000", "0.5", "", 4), "t").is_none());
    }

    #[test]
    fn bad_numbers_drop_the_trade() {
        assert!(normalize(&trade("BTC", "oops", "0.5", "Liquidated Long", 5), "t").is_none());
    }

    #[test]
    fn seen_set_rejects_repeats() {
        let mut seen = SeenSet::new(10);
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert!(seen.insert("b"));
    }

    #[test]
    fn seen_set_trims_to_half_when_full() {
        let mut seen = SeenSet::new(10);
        for i in 0..11 {
            seen.insert(&i.to_string());
        }
        assert_eq!(seen.len(), 5);
        // oldest ids were evicted, so they read as new again
        assert!(seen.insert("0"));
        // the newest survived the trim
        assert!(!seen.insert("10"));
    }

    #[test]
    fn ws_frame_parsing_dedups_by_tid() {
        let mut seen = SeenSet::new(100);
        let frame = r#"{"channel":"trades","data":[
            {"coin":"BTC","px":"90000","sz":"1","dir":"Liquidated Long","tid":7},
            {"coin":"BTC","px":"90000","sz":"1","dir":"Liquidated Long","tid":7},
            {"coin":"BTC","px":"90000","sz":"2","dir":"Buy","tid":8}
        ]}"#;
        let events = parse_ws_trades(frame, &mut seen);
        assert_eq!(events.len(), 1);
        assert_eq!(parse_ws_trades(frame, &mut seen).len(), 0);
    }

    #[test]
    fn non_trade_channels_are_ignored() {
        let mut seen = SeenSet::new(100);
        assert!(parse_ws_trades(r#"{"channel":"pong"}"#, &mut seen).is_empty());
        assert!(parse_ws_trades("garbage", &mut seen).is_empty());
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(10), MAX_RECONNECT_DELAY);
    }

    #[test]
    fn repeated_disconnects_scale_the_backoff() {
        let mut attempt = 0;
        assert_eq!(
            reconnect_state(&mut attempt),
            ConnState::Backoff { attempt: 1 }
        );
        assert_eq!(
            reconnect_state(&mut attempt),
            ConnState::Backoff { attempt: 2 }
        );
        // a successful connect resets the counter
        attempt = 0;
        assert_eq!(
            reconnect_state(&mut attempt),
            ConnState::Backoff { attempt: 1 }
        );
    }
}
