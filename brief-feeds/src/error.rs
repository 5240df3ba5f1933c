//! Error types for the feed adapters

use thiserror::Error;

use brief_core::BriefError;

/// Errors that can occur while fetching or parsing an upstream source
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Failed to parse a feed or API response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Login or session refresh was rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::RequestFailed(err.to_string())
    }
}

impl From<FeedError> for BriefError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::RequestFailed(msg) | FeedError::WebSocket(msg) => BriefError::network(msg),
            FeedError::ApiError { status, message } => {
                BriefError::api(format!("status {status}: {message}"))
            }
            FeedError::ParseError(msg) => BriefError::parse(msg),
            FeedError::AuthFailed(msg) => BriefError::auth(msg),
            FeedError::InvalidConfig(msg) => BriefError::config(msg),
        }
    }
}
