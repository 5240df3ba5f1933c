//! ACLED conflict-event source
//!
//! Session-based API: log in once, reuse the cookie session for reads, and
//! on a 401 re-login a single time and skip the cycle. Events are mapped
//! into headline-shaped [`NewsItem`]s for the geopolitics section.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use brief_core::{FeedCategory, NewsItem};

use crate::error::FeedError;

const ACLED_LOGIN_URL: &str = "https://acleddata.com/user/login?_format=json";
const ACLED_READ_URL: &str = "https://acleddata.com/api/acled/read";
const ACLED_EXPORT_URL: &str = "https://acleddata.com/data-export-tool/";

const EVENT_TYPES: &str = "Battles|Explosions/Remote violence|Violence against civilians";
const EVENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
struct AcledResponse {
    #[serde(default)]
    data: Vec<AcledEvent>,
}

#[derive(Debug, Deserialize)]
struct AcledEvent {
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    sub_event_type: String,
    #[serde(default)]
    actor1: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    location: String,
}

/// Client with lazy login and one re-login on session expiry
pub struct AcledClient {
    client: Client,
    email: String,
    password: String,
    logged_in: bool,
}

impl AcledClient {
    /// None when credentials are not configured
    pub fn new(email: Option<String>, password: Option<String>) -> Option<Self> {
        let email = email.filter(|e| !e.is_empty())?;
        let password = password.filter(|p| !p.is_empty())?;
        Some(Self {
            client: Client::builder()
                .cookie_store(true)
                .timeout(Duration::from_secs(15))
                .build()
                .ok()?,
            email,
            password,
            logged_in: false,
        })
    }

    async fn login(&mut self) -> Result<(), FeedError> {
        let response = self
            .client
            .post(ACLED_LOGIN_URL)
            .json(&json!({ "name": self.email, "pass": self.password }))
            .send()
            .await?;
        if response.status().is_success() {
            info!("ACLED login OK");
            self.logged_in = true;
            Ok(())
        } else {
            self.logged_in = false;
            Err(FeedError::AuthFailed(format!(
                "ACLED login failed: {}",
                response.status()
            )))
        }
    }

    /// Last-24h high-severity conflict events, empty on any failure
    pub async fn fetch_events(&mut self) -> Vec<NewsItem> {
        if !self.logged_in {
            if let Err(e) = self.login().await {
                warn!("{}", e);
                return Vec::new();
            }
        }

        let yesterday = (Utc::now() - chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let date_range = format!("{yesterday}|{today}");
        let limit = EVENT_LIMIT.to_string();
        let response = match self
            .client
            .get(ACLED_READ_URL)
            .query(&[
                ("event_date", date_range.as_str()),
                ("event_date_where", "BETWEEN"),
                ("event_type", EVENT_TYPES),
                ("limit", limit.as_str()),
                (
                    "fields",
                    "event_date|event_type|sub_event_type|actor1|actor2|country|location|notes",
                ),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("ACLED fetch failed: {}", e);
                return Vec::new();
            }
        };

        if response.status().as_u16() == 401 {
            info!("ACLED session expired, re-logging in");
            if let Err(e) = self.login().await {
                warn!("{}", e);
            }
            // skip this cycle, the next one uses the fresh session
            return Vec::new();
        }

        let body: AcledResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("ACLED parse failed: {}", e);
                return Vec::new();
            }
        };

        body.data.iter().map(format_event).collect()
    }
}

fn format_event(ev: &AcledEvent) -> NewsItem {
    let etype = if ev.sub_event_type.is_empty() {
        &ev.event_type
    } else {
        &ev.sub_event_type
    };
    let mut title = format!("[ACLED] {} -- {}, {}", etype, ev.location, ev.country);
    if !ev.actor1.is_empty() {
        title.push_str(&format!(" ({})", ev.actor1));
    }
    NewsItem::new(title, ACLED_EXPORT_URL, None, FeedCategory::Osint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_become_tagged_headlines() {
        let ev = AcledEvent {
            event_type: "Battles".to_string(),
            sub_event_type: "Armed clash".to_string(),
            actor1: "Group A".to_string(),
            country: "Country X".to_string(),
            location: "Townsville".to_string(),
        };
        let item = format_event(&ev);
        assert_eq!(
            item.title,
            "[ACLED] Armed clash -- Townsville, Country X (Group A)"
        );
        assert_eq!(item.category, FeedCategory::Osint);
    }

    #[test]
    fn sub_event_type_falls_back_to_event_type() {
        let ev = AcledEvent {
            event_type: "Battles".to_string(),
            sub_event_type: String::new(),
            actor1: String::new(),
            country: "Country X".to_string(),
            location: "Townsville".to_string(),
        };
        assert!(format_event(&ev).title.starts_with("[ACLED] Battles --"));
    }

    #[test]
    fn missing_credentials_disable_the_client() {
        assert!(AcledClient::new(None, Some("pw".into())).is_none());
        assert!(AcledClient::new(Some("".into()), Some("pw".into())).is_none());
    }
}
