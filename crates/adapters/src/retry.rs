use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::AdapterError;

#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub sleep: Duration,
}

impl RetryConfig {
    pub const fn new(max_attempts: usize, sleep: Duration) -> Self {
        Self {
            max_attempts,
            sleep,
        }
    }

    pub const fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            sleep: Duration::from_secs(1),
        }
    }
}

/// Calls `f` until it succeeds, fails with a non-retryable error, or runs out
/// of attempts. A zero `max_attempts` still makes one call.
pub fn call_with_retry<F, T>(mut f: F, config: &RetryConfig) -> Result<T, AdapterError>
where
    F: FnMut() -> Result<T, AdapterError>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= max_attempts => {
                return Err(if max_attempts == 1 {
                    err
                } else {
                    AdapterError::retry_exhausted(max_attempts, err)
                });
            }
            Err(err) => {
                warn!(
                    "[call_with_retry] attempt {}/{} failed: {}",
                    attempt, max_attempts, err
                );
                if !config.sleep.is_zero() {
                    thread::sleep(config.sleep);
                }
                attempt += 1;
            }
        }
    }
}
