//! Retry logic with exponential backoff.
//!
//! Provides bounded retries of fallible async operations where only some
//! errors are worth another attempt (e.g. provider throttling).

use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Delay after the first failed attempt.
    pub initial_delay: Duration,

    /// Maximum delay between attempts.
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (e.g., 2.0 = double each time).
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config for language model calls.
    ///
    /// Three attempts, waiting 2s then 4s on throttling.
    pub fn model() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }

    /// Override the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Calculate the delay after the failed attempt with the given zero-based index.
    ///
    /// `initial_delay * multiplier^index`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, index: u32) -> Duration {
        let base_delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(index.min(i32::MAX as u32) as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_delay as u64)
    }
}

/// Result of a retry operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,

    /// Number of attempts made.
    pub attempts: u32,

    /// Delays slept between attempts, in order.
    pub delays: Vec<Duration>,
}

/// Retry an async operation while `should_retry` accepts its error.
///
/// Errors rejected by `should_retry` are returned immediately. After
/// `max_attempts` the last error is returned.
pub async fn retry_async_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0;
    let mut delays = Vec::new();

    loop {
        let result = operation().await;
        attempts += 1;

        let retry = match &result {
            Ok(_) => false,
            Err(e) => attempts < max_attempts && should_retry(e),
        };

        if !retry {
            return RetryResult { result, attempts, delays };
        }

        let delay = config.delay_for_attempt(attempts - 1);
        tracing::debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Retrying");
        delays.push(delay);
        tokio::time::sleep(delay).await;
    }
}
