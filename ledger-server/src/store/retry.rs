//! Bounded retry for transient storage failures

use crate::core::{Config, LedgerError, LedgerResult};
use std::time::Duration;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Retry budgets for optimistic-concurrency conflicts and storage I/O
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Re-read/recompute attempts when an order version check fails
    pub max_conflict_retries: u32,
    /// Attempts for an operation hitting transient storage errors
    pub storage_attempts: u32,
    /// First backoff; doubles on every further attempt
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_conflict_retries: config.max_conflict_retries.max(1),
            storage_attempts: config.storage_retry_attempts.max(1),
            backoff: Duration::from_millis(config.storage_retry_backoff_ms),
        }
    }

    /// Backoff before attempt `attempt + 1` (1-based `attempt`)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_conflict_retries: 5,
            storage_attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

/// Run `op`, retrying transient storage errors with exponential backoff
///
/// Structural errors are returned immediately. Once the budget is spent the
/// last transient failure becomes [`LedgerError::StorageUnavailable`].
/// Blocking: call from synchronous engine code only.
pub fn with_storage_retry<T>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: impl FnMut() -> LedgerResult<T>,
) -> LedgerResult<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_transient() => {
                if attempt >= policy.storage_attempts {
                    tracing::error!(operation, attempts = attempt, error = %e, "Storage retries exhausted");
                    return Err(LedgerError::StorageUnavailable { attempts: attempt });
                }
                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient storage error, retrying"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}
