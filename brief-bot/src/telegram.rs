//! Telegram Bot API client
//!
//! Long-polls for updates and sends Markdown messages. Messages longer than
//! Telegram's limit are chunked; a send rejected for bad Markdown is retried
//! once as plain text so a digest never vanishes over a formatting quirk.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram caps messages at 4096 chars; stay under it
const MESSAGE_CHUNK_CHARS: usize = 4000;

/// Long-poll timeout in seconds
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: format!("{TELEGRAM_API_BASE}/bot{token}"),
        }
    }

    /// Send a Markdown message, chunking and degrading to plain text per chunk
    pub async fn send_markdown(&self, chat_id: &str, text: &str) {
        let sanitized = sanitize_markdown(text);
        for chunk in chunk_message(&sanitized, MESSAGE_CHUNK_CHARS) {
            if let Err(e) = self.send_chunk(chat_id, &chunk, Some("Markdown")).await {
                error!("Telegram send failed (parse_mode=Markdown): {}", e);
                match self.send_chunk(chat_id, &chunk, None).await {
                    Ok(()) => info!("Retried without parse_mode OK"),
                    Err(e2) => error!("Telegram send failed (no parse_mode): {}", e2),
                }
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }

    async fn send_chunk(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;
        let parsed: ApiResponse<serde_json::Value> = response.json().await?;
        if !parsed.ok {
            anyhow::bail!(
                "sendMessage rejected: {}",
                parsed.description.unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Vec<Update> {
        let result: anyhow::Result<Vec<Update>> = async {
            let response = self
                .client
                .get(format!("{}/getUpdates", self.base_url))
                .query(&[
                    ("offset", offset.to_string()),
                    ("timeout", POLL_TIMEOUT_SECS.to_string()),
                ])
                .send()
                .await?;
            let parsed: ApiResponse<Vec<Update>> = response.json().await?;
            Ok(parsed.result.unwrap_or_default())
        }
        .await;

        match result {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Wrap bare URLs as `[link](url)` so Telegram's Markdown parser accepts them
///
/// URLs already inside markdown parentheses are left alone.
pub fn sanitize_markdown(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let rest: String = chars[i..].iter().collect();
        let Some(rel) = rest.find("http") else {
            result.extend(&chars[i..]);
            break;
        };
        // rel is a byte offset into rest; recover the char offset
        let rel_chars = rest[..rel].chars().count();
        let http_pos = i + rel_chars;

        result.extend(&chars[i..http_pos]);

        let mut end = http_pos;
        while end < chars.len() && !matches!(chars[end], ' ' | '\n' | ')') {
            end += 1;
        }
        let url: String = chars[http_pos..end].iter().collect();

        if http_pos > 0 && chars[http_pos - 1] == '(' {
            result.push_str(&url);
        } else {
            result.push_str(&format!("[link]({url})"));
        }
        i = end;
    }
    result
}

/// Split into chunks of at most `max_chars` characters
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_urls_are_wrapped() {
        assert_eq!(
            sanitize_markdown("see https://example.com for more"),
            "see [link](https://example.com) for more"
        );
    }

    #[test]
    fn existing_markdown_links_are_untouched() {
        let text = "read [link](https://example.com) now";
        assert_eq!(sanitize_markdown(text), text);
    }

    #[test]
    fn url_at_line_end_is_terminated() {
        assert_eq!(
            sanitize_markdown("top story https://e.com/a\nnext"),
            "top story [link](https://e.com/a)\nnext"
        );
    }

    #[test]
    fn text_without_urls_passes_through() {
        assert_eq!(sanitize_markdown("plain text"), "plain text");
    }

    #[test]
    fn chunks_respect_the_limit() {
        let text = "a".repeat(9_500);
        let chunks = chunk_message(&text, 4_000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 4_000);
        assert_eq!(chunks[2].len(), 1_500);
    }

    #[test]
    fn short_messages_are_one_chunk() {
        assert_eq!(chunk_message("hi", 4_000), vec!["hi".to_string()]);
    }
}
