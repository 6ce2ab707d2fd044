//! Bounded retry with exponential backoff.
//!
//! Only errors that report `is_retryable()` (timeouts, connection failures,
//! 429, 5xx) are retried. Everything else, including 401/403, returns at once.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use oncohub_common::Result;
use oncohub_config::RetryConfig;

use crate::cancel::CancelToken;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.multiplier.max(1.0),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        Duration::from_millis(millis as u64).min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails terminally, runs out of attempts,
    /// or `cancel` fires. Backoff sleeps are cancellable too.
    pub async fn run<T, F, Fut>(&self, what: &str, cancel: &CancelToken, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match cancel.guard(what, op(attempt)).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(what, attempt, max = self.max_attempts, ?delay, error = %e, "Retrying after transient failure");
                    cancel
                        .guard(what, async {
                            tokio::time::sleep(delay).await;
                            Ok(())
                        })
                        .await?;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
