// Bounded retry with jitter-free exponential backoff.
//
// Wraps any Fetcher. Only transient failures are retried; the last error is
// handed back to the adapter, which turns it into "no result".

use std::time::Duration;

use async_trait::async_trait;
use flagstatus_common::RetryConfig;
use tracing::warn;

use crate::error::Result;
use crate::fetcher::Fetcher;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(c: RetryConfig) -> Self {
        Self {
            max_attempts: c.max_attempts.max(1),
            base: c.base,
            min_wait: c.min_wait,
            max_wait: c.max_wait,
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no waiting. For tests and local runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Wait before 1-based attempt `k`. Zero for the first attempt,
    /// otherwise `base * 2^(k-1)` clamped to `[min_wait, max_wait]`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        let raw = self.base.saturating_mul(factor);
        raw.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }
}

/// A Fetcher decorator that applies a RetryPolicy to every request.
pub struct Retrying<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> Retrying<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for Retrying<F> {
    async fn get(&self, url: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.inner.get(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    attempt += 1;
                    let delay = self.policy.delay_before(attempt);
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        backoff_secs = delay.as_secs(),
                        error = %e,
                        "Transient source failure, retrying after backoff"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
