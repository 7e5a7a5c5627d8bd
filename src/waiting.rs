//! Polling helper for "wait until ..." semantics.
//!
//! There is no cancellation token: callers race the predicate against a fixed budget.

use std::future::Future;
use std::time::Duration;

/// Default interval between two predicate checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Re-evaluates `predicate` every `interval` until it holds or `timeout` elapses.
///
/// Returns `true` if the predicate held before the timeout. The predicate is always
/// evaluated at least once, even with a zero timeout.
pub async fn wait_until<F, Fut>(mut predicate: F, interval: Duration, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();

    loop {
        if predicate().await {
            return true;
        }

        if start.elapsed() >= timeout {
            return false;
        }

        tokio::time::sleep(interval).await;
    }
}
