use std::time::Duration;

use tracing::warn;

use docqa_core::config::RetryConfig;
use docqa_core::Error;

/// Bounded retry with exponential backoff for blocking operations.
///
/// `max_attempts` counts the first try, so 2 means one retry. The delay
/// before retry `n` is `initial_backoff * 2^(n-1)`, capped at `max_backoff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

/// The last error of an operation that used up its attempts.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: Error,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the `failures`-th failed attempt.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `op` until it succeeds or the attempts are used up. `op` receives
    /// the 1-based attempt number.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, Exhausted>
    where
        F: FnMut(u32) -> Result<T, Error>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(Exhausted { attempts: attempt, last_error: e })
                }
                Err(e) => {
                    let delay = self.backoff_for(attempt);
                    warn!(attempt, max_attempts = self.max_attempts, delay_ms = delay.as_millis() as u64, error = %e, "attempt failed, retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
