//! Retry policy with exponential backoff and jitter
//!
//! A `RetryPolicy` is a plain value applied at the call site:
//!
//! ```no_run
//! use catalog_harvest::pipeline::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn example(client: &reqwest::Client) -> catalog_harvest::Result<()> {
//! let policy = RetryPolicy::new(4, Duration::from_secs(3), 2.0, 0.1);
//! let url = "https://example.com/image.jpg";
//! policy
//!     .execute(url, || async {
//!         client.get(url).send().await.map_err(|source| {
//!             catalog_harvest::HarvestError::Http { target: url.to_string(), source }
//!         })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Longest single backoff sleep
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// Errors that can tell whether another attempt is worthwhile
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Emitted before every backoff sleep
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent {
    /// The attempt that just failed (1-based)
    pub attempt: u32,

    /// Backoff delay before jitter
    pub base_delay: Duration,

    /// Delay actually slept, jitter included
    pub delay: Duration,

    /// Display form of the failure
    pub cause: String,
}

/// Bounded retries with exponential backoff and randomized jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    jitter_fraction: f64,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is raised to 1 and negative factors are clamped
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
        jitter_fraction: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier: backoff_multiplier.max(1.0),
            jitter_fraction: jitter_fraction.max(0.0),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            config.backoff_multiplier,
            config.jitter_fraction,
        )
    }

    /// A policy that makes exactly one attempt
    #[cfg(test)]
    pub(crate) fn none() -> Self {
        Self::new(1, Duration::ZERO, 1.0, 0.0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pre-jitter delays slept between attempts, one per retry
    ///
    /// Delays grow by the backoff multiplier and saturate at [`MAX_DELAY`].
    pub fn delay_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        let multiplier = self.backoff_multiplier;
        std::iter::successors(Some(self.initial_delay.min(MAX_DELAY)), move |d| {
            Some(scale_delay(*d, multiplier))
        })
        .take(self.max_attempts.saturating_sub(1) as usize)
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// `label` names the operation in retry diagnostics.
    pub async fn execute<T, E, F, Fut>(&self, label: &str, operation: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_observed(label, operation, |_| {}).await
    }

    /// Same as [`execute`](Self::execute), calling `on_retry` before each sleep
    pub async fn execute_observed<T, E, F, Fut, O>(
        &self,
        label: &str,
        mut operation: F,
        mut on_retry: O,
    ) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(&RetryEvent),
    {
        let mut delays = self.delay_schedule();
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_transient() {
                tracing::debug!("{}: not retrying permanent failure: {}", label, error);
                return Err(error);
            }

            let Some(delay) = delays.next() else {
                tracing::warn!(
                    "{}: giving up after {} attempt(s): {}",
                    label,
                    attempt,
                    error
                );
                return Err(error);
            };

            let wait = delay.saturating_add(self.jitter(delay));
            tracing::warn!(
                "{}: attempt {}/{} failed ({}), retrying in {:?}",
                label,
                attempt,
                self.max_attempts,
                error,
                wait
            );
            on_retry(&RetryEvent {
                attempt,
                base_delay: delay,
                delay: wait,
                cause: error.to_string(),
            });

            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    /// Uniform random addition in `[0, jitter_fraction * delay]`
    fn jitter(&self, delay: Duration) -> Duration {
        let max = delay.as_secs_f64() * self.jitter_fraction;
        if max <= 0.0 {
            return Duration::ZERO;
        }
        let secs = rand::rng().random_range(0.0..=max);
        Duration::try_from_secs_f64(secs).unwrap_or(MAX_DELAY)
    }
}

/// Multiplies a delay, saturating at [`MAX_DELAY`]
fn scale_delay(delay: Duration, multiplier: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier)
        .map_or(MAX_DELAY, |scaled| scaled.min(MAX_DELAY))
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::detail_default())
    }
}
