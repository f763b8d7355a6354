//! Resilience patterns for calls that cross a network boundary

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry configuration for exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        std::cmp::min(Duration::from_millis(millis as u64), self.max_delay)
    }
}

/// Errors that know whether another attempt might succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Execute an operation with exponential backoff retry logic.
///
/// The operation receives the 1-based attempt number. Only errors classified as
/// retryable are retried; anything else is returned immediately.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation(attempts).await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempts >= config.max_attempts {
                    return Err(error);
                }

                if !error.is_retryable() {
                    return Err(error);
                }

                let delay = config.delay_after_attempt(attempts);

                tracing::debug!(
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying operation with exponential backoff"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}
