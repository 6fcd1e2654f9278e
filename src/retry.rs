//! Bounded exponential backoff around a single fallible operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Retry policy for flaky external calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `max_retries + 1` attempts in total.
    pub max_retries: u32,
    /// Scale of one backoff step. Retry `k` waits `(2^k + jitter)` units, jitter in `[0, 2)`.
    pub delay_unit: Duration,
    /// Optional ceiling on a single wait.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_unit: Duration::from_secs(1),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before attempt `attempt` (1-based retry number) given a jitter sample.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        if self.delay_unit.is_zero() {
            return Duration::ZERO;
        }
        let factor = 2f64.powi(attempt.min(i32::MAX as u32) as i32) + jitter;
        let delay = Duration::try_from_secs_f64(self.delay_unit.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// The last error is returned unchanged; earlier ones are only logged.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.total_attempts();
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.delay_for(attempt, fastrand::f64() * 2.0);
                debug!(
                    "Retrying {} (attempt {}/{}) after {:.1}s",
                    operation,
                    attempt + 1,
                    attempts,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < attempts => {
                    warn!("{} attempt {}/{} failed: {}", operation, attempt + 1, attempts, e);
                    attempt += 1;
                }
                Err(e) => {
                    warn!("{} failed after {} attempts: {}", operation, attempts, e);
                    return Err(e);
                }
            }
        }
    }
}
