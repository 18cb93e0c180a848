//! Token bucket limiter for a single upstream source.
//!
//! Each adapter owns one limiter sized to its source's published quota, so two
//! sources never share a budget.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use cashsync_core::errors::Result;
use cashsync_core::sync::CancellationFlag;

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
const DEFAULT_BURST_CAPACITY: u32 = 5;

/// Longest single sleep between cancellation checks.
const MAX_WAIT_SLICE: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_capacity.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Takes a token, or returns how long until one is available.
    fn take(&mut self) -> std::result::Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.rate))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BURST_CAPACITY,
        }
    }
}

pub struct RateLimiter {
    source_id: &'static str,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(source_id: &'static str, config: RateLimitConfig) -> Self {
        Self {
            source_id,
            bucket: Mutex::new(TokenBucket::new(&config)),
        }
    }

    /// Recovers from poison: a skewed token count is harmless.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter for '{}' was poisoned, recovering", self.source_id);
            poisoned.into_inner()
        })
    }

    /// Takes a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().take().is_ok()
    }

    /// Waits until a token is available or the run is cancelled.
    pub async fn acquire(&self, cancel: &CancellationFlag) -> Result<()> {
        loop {
            cancel.check()?;
            let wait = match self.lock_bucket().take() {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };
            debug!("Rate limiter: waiting {:?} for '{}'", wait, self.source_id);
            tokio::time::sleep(wait.min(MAX_WAIT_SLICE)).await;
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("source_id", &self.source_id)
            .finish_non_exhaustive()
    }
}
