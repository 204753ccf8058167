//! Racing combinators.
//!
//! [`first_settled`] awaits two futures and commits to whichever finishes
//! first. [`with_timeout`] builds on it to bound an [`Eventual`] with a
//! deadline: the producer and the timer share one [`Completer`], so whichever
//! side settles second is a no-op.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{select, Either};
use tracing::trace;

use crate::eventual::{self, Completer, Eventual};

/// Await both futures, return the output of the first to finish and drop the
/// other.
pub async fn first_settled<T, A, B>(a: A, b: B) -> T
where
    A: Future<Output = T>,
    B: Future<Output = T>,
{
    match select(pin!(a), pin!(b)).await {
        Either::Left((value, _)) | Either::Right((value, _)) => value,
    }
}

/// Start a producer under a deadline.
///
/// `start` receives a completer and may settle it at any time, including
/// synchronously. If nothing has settled after `deadline`, the value becomes
/// `on_timeout()`. Must be called within a tokio runtime.
pub fn with_timeout<T, S, F>(deadline: Duration, on_timeout: F, start: S) -> Eventual<T>
where
    T: Send + Sync + 'static,
    S: FnOnce(Completer<T>),
    F: FnOnce() -> T + Send + 'static,
{
    let (completer, eventual) = eventual::pending();
    race_deadline(completer, deadline, on_timeout, start);
    eventual
}

/// Like [`with_timeout`], for an eventual the caller has already created and
/// published.
pub fn race_deadline<T, S, F>(completer: Completer<T>, deadline: Duration, on_timeout: F, start: S)
where
    T: Send + Sync + 'static,
    S: FnOnce(Completer<T>),
    F: FnOnce() -> T + Send + 'static,
{
    let expires_at = tokio::time::Instant::now() + deadline;
    start(completer.clone());

    if completer.is_settled() {
        return;
    }

    tokio::spawn(async move {
        let expired = first_settled(
            async {
                tokio::time::sleep_until(expires_at).await;
                true
            },
            async {
                completer.settled().await;
                false
            },
        )
        .await;

        if expired && completer.complete(on_timeout()) {
            trace!(deadline_ms = deadline.as_millis() as u64, "deadline won the race");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_first_settled_takes_faster() {
        let value = first_settled(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                "slow"
            },
            async { "fast" },
        )
        .await;
        assert_eq!(value, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_producer_silent() {
        let start = Instant::now();
        let eventual = with_timeout(Duration::from_millis(50), || "timeout", |_completer| {});

        assert_eq!(eventual.wait().await, "timeout");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_beats_deadline() {
        let eventual = with_timeout(Duration::from_millis(50), || "timeout", |completer| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                completer.complete("done");
            });
        });

        assert_eq!(eventual.wait().await, "done");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(eventual.peek(), Some("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_producer_is_ignored() {
        let (late_tx, late_rx) = tokio::sync::oneshot::channel();
        let eventual = with_timeout(Duration::from_millis(20), || "timeout", |completer| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                let _ = late_tx.send(completer.complete("late"));
            });
        });

        assert_eq!(eventual.wait().await, "timeout");
        assert!(!late_rx.await.unwrap(), "late completion must be a no-op");
        assert_eq!(eventual.peek(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_synchronous_producer() {
        let eventual = with_timeout(Duration::from_secs(5), || 0, |completer| {
            completer.complete(42);
        });
        assert_eq!(eventual.peek(), Some(42));
    }
}
