//! Bounded exponential-backoff retry around remote calls
//!
//! - Attempts: `max_attempts`, including the first
//! - Delay after failed attempt `n`: `initial_delay * backoff_factor^(n-1)`
//! - No sleep after the final attempt
//! - The terminal error is returned unchanged

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::errors::ServiceError;

/// Which failures are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Retry every failure
    #[default]
    All,
    /// Retry only transport, timeout, rate-limit and 5xx failures
    TransientOnly,
}

impl RetryPolicy {
    pub fn should_retry(self, error: &ServiceError) -> bool {
        match self {
            RetryPolicy::All => true,
            RetryPolicy::TransientOnly => error.is_transient(),
        }
    }
}

/// Retry executor with geometric backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    policy: RetryPolicy,
    enable_jitter: bool,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryExecutor {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_factor,
            policy: RetryPolicy::All,
            enable_jitter: false,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_delay_ms),
            config.backoff_factor,
        )
        .with_policy(config.policy)
        .with_jitter(config.jitter)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_jitter(mut self, enable: bool) -> Self {
        self.enable_jitter = enable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation` until it succeeds, the policy declines, or attempts run out
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= self.max_attempts || !self.policy.should_retry(&e) {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        kind = ?e.kind,
                        error = %e.message,
                        "Remote call failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);

        // ±25% jitter
        let final_ms = if self.enable_jitter {
            let jitter = delay_ms / 4.0;
            (delay_ms + (rand::random::<f64>() * 2.0 - 1.0) * jitter).max(0.0)
        } else {
            delay_ms
        };

        Duration::from_millis(final_ms.round() as u64)
    }

    /// Total sleep time when every attempt fails (without jitter)
    pub fn max_total_wait_time(&self) -> Duration {
        (1..self.max_attempts).map(|n| self.calculate_delay(n)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceErrorKind;
    use std::sync::{Arc, Mutex};

    fn fast(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(max_attempts, Duration::from_millis(1), 1.7)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result = fast(4)
            .execute(move || {
                let count = count.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Ok::<i32, ServiceError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_success_on_second_attempt() {
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result = fast(4)
            .execute(move || {
                let count = count.clone();
                async move {
                    let mut n = count.lock().unwrap();
                    *n += 1;
                    if *n < 2 {
                        Err(ServiceError::new(ServiceErrorKind::Server, "HTTP 503"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_terminal_error() {
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result = fast(4)
            .execute(move || {
                let count = count.clone();
                async move {
                    let mut n = count.lock().unwrap();
                    *n += 1;
                    Err::<(), _>(ServiceError::new(
                        ServiceErrorKind::Timeout,
                        format!("attempt {}", *n),
                    ))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(*attempts.lock().unwrap(), 4);
        assert_eq!(err.kind, ServiceErrorKind::Timeout);
        assert_eq!(err.message, "attempt 4");
    }

    #[tokio::test]
    async fn test_all_policy_retries_permanent_errors() {
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let _ = fast(3)
            .execute(move || {
                let count = count.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Err::<(), _>(ServiceError::new(ServiceErrorKind::InvalidRequest, "bad"))
                }
            })
            .await;

        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_transient_only_stops_on_permanent_error() {
        let attempts = Arc::new(Mutex::new(0));
        let count = attempts.clone();

        let result = fast(4)
            .with_policy(RetryPolicy::TransientOnly)
            .execute(move || {
                let count = count.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Err::<(), _>(ServiceError::new(ServiceErrorKind::Unauthorized, "HTTP 401"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn test_calculate_delay() {
        let retry = RetryExecutor::new(4, Duration::from_millis(1000), 1.7);

        assert_eq!(retry.calculate_delay(1), Duration::from_millis(1000));
        assert_eq!(retry.calculate_delay(2), Duration::from_millis(1700));
        assert_eq!(retry.calculate_delay(3), Duration::from_millis(2890));
    }

    #[test]
    fn test_max_total_wait_time() {
        let retry = RetryExecutor::default();
        // 1000 + 1700 + 2890
        assert_eq!(retry.max_total_wait_time(), Duration::from_millis(5590));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let retry = RetryExecutor::new(4, Duration::from_millis(1000), 2.0).with_jitter(true);
        for _ in 0..50 {
            let ms = retry.calculate_delay(2).as_millis();
            assert!((1500..=2500).contains(&ms));
        }
    }
}
