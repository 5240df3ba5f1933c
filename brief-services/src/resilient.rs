//! Retry-with-fallback wrapper for flaky upstream calls
//!
//! Every external fetch in the pipeline runs through [`run_or`]: each attempt
//! is bounded by a timeout, failures back off linearly in the attempt number,
//! and once attempts are exhausted the caller's fallback value is returned.
//! Errors are logged but never propagate past this layer.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use brief_core::{BriefError, BriefResult};

/// Per-operation retry settings
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub op: &'static str,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Feed fetch + parse. Single attempt, the poll loop retries on its
    /// own cadence.
    pub fn feed_parse() -> Self {
        Self {
            op: "feed_parse",
            max_attempts: 1,
            base_delay: Duration::ZERO,
            timeout: Duration::from_secs(10),
        }
    }

    /// Quote and indicator lookups
    pub fn market_data() -> Self {
        Self {
            op: "market_data",
            max_attempts: 1,
            base_delay: Duration::ZERO,
            timeout: Duration::from_secs(8),
        }
    }

    /// LLM completion calls. 3s, 6s backoff between attempts.
    pub fn summarize() -> Self {
        Self {
            op: "summarize",
            max_attempts: 3,
            base_delay: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Run `op` under `policy`, returning `fallback` if every attempt fails
///
/// Backoff before attempt N+1 is `base_delay * N`.
pub async fn run_or<T, F, Fut>(policy: RetryPolicy, fallback: T, mut op: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BriefResult<T>>,
{
    for attempt in 1..=policy.max_attempts {
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(BriefError::timeout(format!(
                "{} exceeded {}s",
                policy.op,
                policy.timeout.as_secs()
            ))),
        };

        match result {
            Ok(value) => return value,
            Err(err) => {
                if attempt < policy.max_attempts {
                    warn!(
                        op = policy.op,
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(policy.base_delay * attempt).await;
                } else {
                    error!(
                        op = policy.op,
                        attempts = policy.max_attempts,
                        error = %err,
                        "all attempts failed, using fallback"
                    );
                }
            }
        }
    }
    fallback
}
