//! Error types shared across the brief pipeline

use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum BriefError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Source error ({source_id}): {message}")]
    Source { source_id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BriefError {
    pub fn api(msg: impl Into<String>) -> Self {
        BriefError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        BriefError::Network(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        BriefError::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        BriefError::Parse(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        BriefError::Timeout(msg.into())
    }

    pub fn source(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        BriefError::Source {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        BriefError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        BriefError::Internal(msg.into())
    }
}

/// Result type alias for brief operations
pub type BriefResult<T> = Result<T, BriefError>;
