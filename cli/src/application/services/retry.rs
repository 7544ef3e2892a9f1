//! Bounded fixed-backoff retry for network steps.

use std::future::Future;

use crate::domain::{RetryPolicy, WorkflowError};

/// Run `op` until it succeeds or `policy.attempts` is exhausted, sleeping
/// `policy.backoff()` between attempts.
///
/// `op` receives the 1-based attempt number. Every `Err` counts as a failed
/// attempt; exhaustion becomes [`WorkflowError::Transient`] carrying the last
/// error message.
///
/// # Errors
///
/// Returns `WorkflowError::Transient` once every attempt has failed.
pub async fn with_retry<T, F, Fut>(
    step: &'static str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, WorkflowError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut last = String::new();
    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(step, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                last = format!("{e:#}");
                tracing::warn!(step, attempt, max_attempts = attempts, error = %last, "attempt failed");
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff()).await;
                }
            }
        }
    }
    Err(WorkflowError::Transient {
        step,
        attempts,
        last,
    })
}
