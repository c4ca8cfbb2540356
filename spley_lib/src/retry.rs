//! Bounded retry with backoff, shared by every navigator step.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure.
    Fixed(Duration),
    /// `delay * n` after the n-th failure.
    Linear(Duration),
}

impl Backoff {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Linear(d) => d.saturating_mul(attempt.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn linear(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear(delay),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
///
/// Returns the last outcome together with the number of retries performed
/// (attempts beyond the first).
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: P,
    mut op: F,
) -> (Result<T, E>, u32)
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return (Ok(value), attempt - 1),
            Err(err) => {
                if !is_retryable(&err) {
                    tracing::warn!("{} failed, not retrying: {}", label, err);
                    return (Err(err), attempt - 1);
                }
                if attempt >= max {
                    tracing::error!("{} failed after {} attempts: {}", label, attempt, err);
                    return (Err(err), attempt - 1);
                }
                let delay = policy.backoff.delay_for_attempt(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {:.1}s: {}",
                    label,
                    attempt,
                    max,
                    delay.as_secs_f64(),
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
