//! Retry-with-backoff for writes against the single-writer SQLite store.
//!
//! SQLite admits one writer at a time. When a second connection tries to
//! start a write it gets `SQLITE_BUSY` (or `SQLITE_LOCKED`) back immediately,
//! because connections are opened with `busy_timeout = 0`. [`perform_write`]
//! is the only place that contention is absorbed: the operation is re-run
//! with exponentially growing, jittered delays until it succeeds, fails with
//! a non-contention error, or the retry budget is spent.

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, Result};

/// Backoff parameters for [`perform_write`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound for the un-jittered delay.
    pub max_delay: Duration,
    /// Fractional jitter applied to each delay, e.g. `0.25` for ±25%.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay before retry number `retry` (0-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2f64.powi(retry.min(31) as i32);
        let delay = Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor);
        delay.min(self.max_delay)
    }

    /// Delay with a uniformly random jitter of up to `±jitter` applied.
    pub fn jittered_delay(&self, retry: u32) -> Duration {
        let delay = self.delay_for_retry(retry);
        if self.jitter <= 0.0 {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        Duration::from_secs_f64((delay.as_secs_f64() * (1.0 + factor)).max(0.0))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Run `operation`, retrying on writer contention according to `policy`.
///
/// Non-contention errors are returned from the attempt that produced them.
/// If every attempt reports contention the result is
/// [`AppError::RetriesExhausted`].
pub fn perform_write<T, F>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = policy.max_attempts();

    for attempt in 0..attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_contention() => {
                if attempt + 1 == attempts {
                    tracing::warn!(attempts, error = %err, "write contention outlasted retry budget");
                    break;
                }
                let delay = policy.jittered_delay(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "database busy, retrying write"
                );
                thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }

    Err(AppError::RetriesExhausted { attempts })
}
