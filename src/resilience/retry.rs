//! # Connection Retry
//!
//! Fixed-delay retry with an attempt cap by default, generalized to an
//! optional exponential curve with jitter.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::error::{Result, WorkerError};

/// Delay curve between connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay after every failed attempt
    #[default]
    Fixed,
    /// Base delay multiplied by `multiplier` per failed attempt, capped at `max_delay`
    Exponential,
}

/// Bounded retry policy for startup connections
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: BackoffKind,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff: config.backoff,
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    /// Fixed-delay policy
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            backoff: BackoffKind::Fixed,
            multiplier: 1.0,
            max_delay: delay,
            jitter: false,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// A product that overflows `Duration` or is not a number saturates at
    /// `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Exponential => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                self.scaled(self.base_delay, self.multiplier.powi(exponent))
                    .min(self.max_delay)
            }
        };

        if self.jitter {
            let jitter = fastrand::f64() * 0.1; // 10% jitter
            self.scaled(delay, 1.0 + jitter)
                .min(self.max_delay.max(self.base_delay))
        } else {
            delay
        }
    }

    fn scaled(&self, delay: Duration, factor: f64) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(self.max_delay)
    }
}

/// Run `connect` until it succeeds or the policy is exhausted.
///
/// `connect` receives the 1-based attempt number. It is responsible for
/// releasing anything it built before returning an error. Errors that are not
/// retryable ([`WorkerError::is_retryable`]) end the loop immediately.
pub async fn retry_connect<T, F, Fut>(
    dependency: &str,
    policy: &RetryPolicy,
    mut connect: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        info!(
            dependency = dependency,
            attempt = attempt,
            max_attempts = max_attempts,
            "Connecting to dependency"
        );

        let err = match connect(attempt).await {
            Ok(handle) => {
                info!(
                    dependency = dependency,
                    attempt = attempt,
                    "Connection established successfully"
                );
                return Ok(handle);
            }
            Err(err) => err,
        };

        warn!(
            dependency = dependency,
            attempt = attempt,
            max_attempts = max_attempts,
            error = %err,
            "Connection attempt failed"
        );

        if !err.is_retryable() {
            error!(
                dependency = dependency,
                attempt = attempt,
                error = %err,
                "Connection failed with a non-retryable error"
            );
            return Err(WorkerError::connection(dependency, attempt, err.to_string()));
        }

        if attempt == max_attempts {
            error!(
                dependency = dependency,
                attempts = attempt,
                error = %err,
                "Exhausted connection attempts"
            );
            return Err(WorkerError::connection(dependency, attempt, err.to_string()));
        }

        let delay = policy.delay_after(attempt);
        info!(
            dependency = dependency,
            delay_ms = delay.as_millis() as u64,
            "Retrying connection"
        );
        tokio::time::sleep(delay).await;
    }

    unreachable!("retry loop returns on success, exhaustion, or a non-retryable error")
}
