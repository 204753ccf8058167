//! Settle-once eventual values.
//!
//! An [`Eventual`] starts pending and settles to exactly one value. The write
//! side is a [`Completer`]; it can be cloned and handed to several producers
//! (a resource inserter and a deadline timer, say). The first `complete`
//! call wins and every later call is a no-op, so a late producer can never
//! overwrite or re-announce a settled value.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Create a pending eventual together with its completer.
pub fn pending<T>() -> (Completer<T>, Eventual<T>) {
    let (tx, rx) = watch::channel(None);
    (Completer { tx: Arc::new(tx) }, Eventual { rx })
}

/// Read side of a settle-once value. Clones observe the same value.
pub struct Eventual<T> {
    rx: watch::Receiver<Option<T>>,
}

/// Write side of a settle-once value.
pub struct Completer<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T: Clone> Eventual<T> {
    /// An eventual that is already settled.
    pub fn ready(value: T) -> Self {
        let (_tx, rx) = watch::channel(Some(value));
        Self { rx }
    }

    /// Current value, or `None` while pending.
    pub fn peek(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Whether the value has settled.
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Whether `other` is the same eventual (not merely an equal value).
    pub fn same_as(&self, other: &Self) -> bool {
        self.rx.same_channel(&other.rx)
    }

    /// Wait for the value.
    ///
    /// If every completer is dropped without settling, this never returns.
    /// Use [`race::with_timeout`](crate::race::with_timeout) to bound it.
    pub async fn wait(&self) -> T {
        let mut rx = self.rx.clone();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };
        match settled {
            Some(value) => value,
            None => std::future::pending().await,
        }
    }
}

impl<T> Completer<T> {
    /// Settle the value. Returns `false` if it had already settled.
    pub fn complete(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    /// Whether the value has settled.
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Resolve once the value has settled, by any completer.
    pub async fn settled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender is held by `self`, so the channel cannot close here.
        let _ = rx.wait_for(Option::is_some).await;
    }
}

impl<T> Clone for Eventual<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.rx.borrow() {
            Some(value) => f.debug_tuple("Eventual::Settled").field(value).finish(),
            None => f.write_str("Eventual::Pending"),
        }
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("settled", &self.tx.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completion_wins() {
        let (completer, eventual) = pending::<u32>();
        assert!(eventual.peek().is_none());

        assert!(completer.complete(1));
        assert!(!completer.clone().complete(2));
        assert_eq!(eventual.peek(), Some(1));
    }

    #[test]
    fn test_ready_is_settled() {
        let eventual = Eventual::ready("done");
        assert!(eventual.is_settled());
        assert_eq!(eventual.peek(), Some("done"));
    }

    #[test]
    fn test_same_as_is_identity() {
        let (_c1, a) = pending::<u8>();
        let (_c2, b) = pending::<u8>();
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[tokio::test]
    async fn test_wait_sees_later_completion() {
        let (completer, eventual) = pending::<String>();
        let waiter = tokio::spawn({
            let eventual = eventual.clone();
            async move { eventual.wait().await }
        });

        tokio::task::yield_now().await;
        completer.complete("value".to_string());

        assert_eq!(waiter.await.unwrap(), "value");
        assert_eq!(eventual.wait().await, "value");
    }

    #[tokio::test]
    async fn test_wait_on_ready_after_sender_dropped() {
        let (completer, eventual) = pending::<u8>();
        completer.complete(7);
        drop(completer);
        assert_eq!(eventual.wait().await, 7);
    }

    #[tokio::test]
    async fn test_settled_resolves_for_other_completer() {
        let (completer, _eventual) = pending::<u8>();
        let other = completer.clone();
        let watcher = tokio::spawn(async move { completer.settled().await });
        tokio::task::yield_now().await;
        other.complete(3);
        watcher.await.unwrap();
        assert!(other.is_settled());
    }
}
