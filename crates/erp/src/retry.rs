//! Retry policy for upstream calls.
//!
//! The policy is a value object injected into each adapter. Sleeping goes
//! through [`Sleeper`] so tests can record delays instead of waiting.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;

use cashsync_core::errors::{Error, Result, RetryClass, UpstreamError};
use cashsync_core::sync::CancellationFlag;

/// How often a backoff wait looks at the cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How the delay grows between retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `base * n`: 30s, 60s, 90s with the default base.
    #[default]
    Incremental,
    /// `base * 2^(n-1)`.
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Extra random delay as a fraction of the computed delay (0.0 disables).
    pub jitter: f64,
    /// Multiplier applied to the delay after a 429.
    pub rate_limit_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Incremental,
            jitter: 0.0,
            rate_limit_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    pub fn base_delay_for(&self, retry: u32, class: RetryClass) -> Duration {
        let retry = retry.max(1);
        let delay = match self.strategy {
            BackoffStrategy::Incremental => self.base_delay.saturating_mul(retry),
            BackoffStrategy::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(retry - 1)),
        };
        match class {
            RetryClass::RateLimitBackoff => delay.saturating_mul(self.rate_limit_multiplier.max(1)),
            _ => delay,
        }
    }

    fn delay_for(&self, retry: u32, error: &UpstreamError) -> Duration {
        let mut delay = self.base_delay_for(retry, error.retry_class());
        if let UpstreamError::RateLimited {
            retry_after: Some(retry_after),
            ..
        } = error
        {
            delay = delay.max(*retry_after);
        }
        if self.jitter > 0.0 {
            let factor = rand::thread_rng().gen_range(0.0..=self.jitter);
            delay += delay.mul_f64(factor);
        }
        delay
    }

    /// Runs `op` until it succeeds or the run is cancelled. Only upstream
    /// errors are retried, and only while retries remain.
    pub async fn execute<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        cancel: &CancellationFlag,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0u32;
        loop {
            cancel.check()?;
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(Error::Upstream(error)) => error,
                Err(other) => return Err(other),
            };

            if error.retry_class() == RetryClass::Never {
                return Err(Error::Upstream(error));
            }
            if retry >= self.max_retries {
                warn!(
                    "Giving up on {} after {} retries: {}",
                    error.source_id(),
                    retry,
                    error
                );
                return Err(Error::Upstream(error));
            }

            retry += 1;
            let delay = self.delay_for(retry, &error);
            warn!(
                "{}; retry {}/{} in {:?}",
                error, retry, self.max_retries, delay
            );
            tokio::select! {
                _ = sleeper.sleep(delay) => {}
                _ = cancelled(cancel) => {
                    debug!("Backoff for {} interrupted by cancellation", error.source_id());
                    return Err(Error::Cancelled);
                }
            }
            debug!("Retrying {} (attempt {})", error.source_id(), retry + 1);
        }
    }
}

/// Resolves once `cancel` is set.
async fn cancelled(cancel: &CancellationFlag) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}
