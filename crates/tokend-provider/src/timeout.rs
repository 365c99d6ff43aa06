//! Bounded execution of network futures.

use std::future::Future;
use std::time::Duration;
use tokend_error::{Result, TokendError};
use tokio::time::timeout;

/// Execute a future with a timeout
pub async fn with_timeout<T>(
    duration: Duration,
    operation: impl Into<String>,
    future: impl Future<Output = T>,
) -> Result<T> {
    let op = operation.into();
    timeout(duration, future).await.map_err(|_| {
        tracing::warn!(operation = %op, timeout_ms = duration.as_millis() as u64, "operation timed out");
        TokendError::Timeout {
            operation: op,
            seconds: whole_seconds(duration),
        }
    })
}

// Rounds up so sub-second bounds never report 0s.
fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
