//! Bounded startup retry.
//!
//! Both backends may still be starting when the program launches, so the
//! first connection is attempted a fixed number of times with a fixed delay.
//! Nothing else in the crate retries.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::ValkeyError;
use crate::relational::SourceError;

/// Errors that can tell whether another attempt may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ValkeyError {
    fn is_retryable(&self) -> bool {
        self.is_connectivity()
    }
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        self.is_connectivity()
    }
}

/// How often and how patiently to retry a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Run `connect` until it succeeds, fails with a non-retryable error, or the
/// attempts run out. The last error is returned.
pub async fn connect_with_retry<T, E, F, Fut>(
    target: &str,
    policy: RetryPolicy,
    mut connect: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(target_name = target, attempt, "Connected after retrying");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    target_name = target,
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Connection failed, retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
