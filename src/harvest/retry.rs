//! Bounded retry around single page navigations

use crate::config::{BackoffKind, HarvestConfig};
use crate::harvest::fetcher::{RenderedPage, Session};
use crate::FetchError;
use std::time::Duration;

/// How many times, and how patiently, a page fetch is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub delay: Duration,

    pub backoff: BackoffKind,

    /// Bound on a single attempt; exceeding it counts as a timeout
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            backoff: config.backoff,
            attempt_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.delay,
            BackoffKind::Exponential => {
                let factor = 1u32 << attempt.saturating_sub(1).min(16);
                self.delay.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}

/// Terminal failure of a retried fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    /// Error of the final attempt
    pub error: FetchError,

    pub attempts: u32,
}

/// Opens `url` in `session`, retrying failed attempts per `policy`
///
/// # Returns
///
/// * `Ok((page, attempts))` - The page and the number of attempts it took
/// * `Err(RetryExhausted)` - Every attempt failed
pub async fn open_with_retry(
    session: &mut dyn Session,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(RenderedPage, u32), RetryExhausted> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(policy.attempt_timeout, session.open(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };

        match result {
            Ok(page) => {
                session.settle().await;
                return Ok((page, attempt));
            }
            Err(error) => {
                tracing::warn!(
                    "Attempt {}/{} failed for {}: {}",
                    attempt,
                    policy.max_attempts,
                    url,
                    error
                );

                if attempt >= policy.max_attempts {
                    return Err(RetryExhausted {
                        error,
                        attempts: attempt,
                    });
                }

                let delay = policy.delay_after(attempt);
                tracing::debug!("Retrying {} in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
