//! Morning Brief Telegram bot
//!
//! Wires the liquidation ingestion tasks, the scheduler, the push-account
//! poller and the command loop around a shared digest builder.

mod commands;
mod config;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike, Utc};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brief_core::FeedCategory;
use brief_feeds::{
    default_push_accounts, AcledClient, LiquidationPoller, LiquidationStream, MarketDataClient,
    PushPoller, RssClient, DEFAULT_COINS,
};
use brief_services::{DigestBuilder, DigestConfig, EventCache, LastBriefStore};
use brief_summarizer::Summarizer;

use config::{BotConfig, LiqSource};
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Not an error if the file doesn't exist
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,brief_bot=debug")),
        )
        .init();

    info!("Starting Morning Brief bot");

    let config = BotConfig::from_env()?;
    if config.finnhub_key.is_none() {
        info!("No FINNHUB_KEY set - economic calendar will be empty");
    }

    let cache = Arc::new(EventCache::new(config.cache_capacity));

    // Liquidation ingestion: source task feeds the channel, forwarder owns
    // the cache writes
    let (events_tx, mut events_rx) = mpsc::channel(256);
    let coins: Vec<String> = DEFAULT_COINS.iter().map(|s| s.to_string()).collect();
    match config.liq_source {
        LiqSource::Websocket => {
            tokio::spawn(LiquidationStream::new(coins, events_tx).run());
            info!("Hyperliquid WebSocket stream started");
        }
        LiqSource::Rest => {
            tokio::spawn(LiquidationPoller::new(coins, events_tx).run());
            info!("Hyperliquid liquidation poller started");
        }
    }
    let ingest_cache = Arc::clone(&cache);
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            ingest_cache.append(event);
        }
    });

    let digest_config = DigestConfig {
        rsshub_base: config.rsshub_base.clone(),
        thresholds: config.thresholds.clone(),
        ..DigestConfig::default()
    };
    let builder = Arc::new(DigestBuilder::new(
        digest_config,
        RssClient::new(),
        MarketDataClient::new(config.finnhub_key.clone()),
        Summarizer::new(config.groq_api_key.clone()),
        AcledClient::new(config.acled_email.clone(), config.acled_password.clone()),
        Arc::clone(&cache),
        LastBriefStore::new(&config.last_brief_path),
    ));
    let telegram = Arc::new(TelegramClient::new(&config.telegram_token));

    spawn_scheduler(
        Arc::clone(&builder),
        Arc::clone(&telegram),
        config.channel_id.clone(),
        config.brief_hours.clone(),
    );
    spawn_push_poller(
        Arc::clone(&telegram),
        config.channel_id.clone(),
        config.rsshub_base.clone(),
    );

    info!("Morning Brief bot STARTED");

    tokio::select! {
        _ = update_loop(&builder, &telegram) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
    Ok(())
}

/// Sends the scheduled brief once per configured hour
fn spawn_scheduler(
    builder: Arc<DigestBuilder>,
    telegram: Arc<TelegramClient>,
    channel_id: String,
    brief_hours: Vec<u32>,
) {
    tokio::spawn(async move {
        let mut last_sent: Option<(NaiveDate, u32)> = None;
        let mut ticker = interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let hour = now.hour();
            if !brief_hours.contains(&hour) || now.minute() != 0 {
                continue;
            }
            let key = (now.date_naive(), hour);
            if last_sent == Some(key) {
                continue;
            }
            last_sent = Some(key);
            info!("Sending scheduled brief ({:02}:00 UTC slot)", hour);
            let brief = builder.build_full().await;
            telegram.send_markdown(&channel_id, &brief).await;
        }
    });
}

/// Polls the push accounts every 10 minutes, alerting on new posts
fn spawn_push_poller(telegram: Arc<TelegramClient>, channel_id: String, rsshub_base: String) {
    tokio::spawn(async move {
        let mut poller = PushPoller::new(rsshub_base, default_push_accounts());
        // first poll only seeds seen ids
        poller.poll().await;

        let mut ticker = interval(Duration::from_secs(600));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            for alert in poller.poll().await {
                let emoji = match alert.category {
                    FeedCategory::Osint => "\u{1f6a8}",
                    _ => "\u{1f4ca}",
                };
                let mut msg = format!("{} *@{}*\n{}", emoji, alert.handle, alert.title);
                if !alert.link.is_empty() {
                    msg.push_str(&format!("\n[link]({})", alert.link));
                }
                telegram.send_markdown(&channel_id, &msg).await;
                info!("Push alert sent for @{}", alert.handle);
            }
        }
    });
}

/// Long-polls Telegram and dispatches commands
async fn update_loop(builder: &Arc<DigestBuilder>, telegram: &Arc<TelegramClient>) {
    let mut offset = 0i64;
    loop {
        for update in telegram.get_updates(offset).await {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(commands::parse_command) else {
                continue;
            };
            let builder = Arc::clone(builder);
            let telegram = Arc::clone(telegram);
            let chat_id = message.chat.id.to_string();
            // commands can block on the model for a while, keep polling
            tokio::spawn(async move {
                commands::dispatch(command, &builder, &telegram, &chat_id).await;
            });
        }
    }
}
