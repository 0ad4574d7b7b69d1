//! Single-flight load handle.
//!
//! A [`LoadHandle`] wraps one not-yet-started load. The first caller of
//! [`LoadHandle::wait`] spawns the load onto the runtime; every caller, before
//! or after completion, gets a clone of the same memoized result. Because the
//! load runs on its own task, dropping a waiter never cancels it.

use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Notify, OnceCell};
use tokio::task::JoinError;

type PendingLoad<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identity of one load handle.
///
/// Lets a load remove its own coalescing-cache entry without touching a
/// newer handle registered under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    fn next() -> Self {
        Self(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared, memoized result of a single load.
///
/// Cloning is cheap; all clones observe the same load.
pub struct LoadHandle<T, E> {
    shared: Arc<Shared<T, E>>,
}

struct Shared<T, E> {
    ticket: Ticket,
    pending: Mutex<Option<PendingLoad<T, E>>>,
    outcome: OnceCell<Result<T, E>>,
    resolved: Notify,
}

impl<T, E> Clone for LoadHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> std::fmt::Debug for LoadHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadHandle")
            .field("ticket", &self.shared.ticket)
            .field("resolved", &self.shared.outcome.initialized())
            .finish_non_exhaustive()
    }
}

impl<T, E> LoadHandle<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + From<JoinError> + Send + Sync + 'static,
{
    /// Create a handle around a load that has not started yet.
    ///
    /// `make_load` receives the handle's [`Ticket`] so the load can refer to
    /// its own registration.
    pub fn new<F, Fut>(make_load: F) -> Self
    where
        F: FnOnce(Ticket) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let ticket = Ticket::next();
        let load: PendingLoad<T, E> = Box::pin(make_load(ticket));

        Self {
            shared: Arc::new(Shared {
                ticket,
                pending: Mutex::new(Some(load)),
                outcome: OnceCell::new(),
                resolved: Notify::new(),
            }),
        }
    }

    /// This handle's identity.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.shared.ticket
    }

    /// Whether the load has finished.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.shared.outcome.initialized()
    }

    /// Wait for the load's result, starting the load if nobody has yet.
    pub async fn wait(&self) -> Result<T, E> {
        self.start();

        loop {
            let mut notified = pin!(self.shared.resolved.notified());
            notified.as_mut().enable();

            if let Some(outcome) = self.shared.outcome.get() {
                return outcome.clone();
            }

            notified.await;
        }
    }

    fn start(&self) {
        let load = self
            .shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(load) = load else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            // A panicking load must still resolve the handle.
            let outcome = match tokio::spawn(load).await {
                Ok(outcome) => outcome,
                Err(err) => Err(E::from(err)),
            };

            if shared.outcome.set(outcome).is_err() {
                tracing::warn!(ticket = ?shared.ticket, "load handle resolved twice");
            }
            shared.resolved.notify_waiters();
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestError {
        Failed,
        Aborted,
    }

    impl From<JoinError> for TestError {
        fn from(_: JoinError) -> Self {
            Self::Aborted
        }
    }

    fn counting_handle(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> LoadHandle<u32, TestError> {
        let calls = Arc::clone(calls);
        LoadHandle::new(move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(42)
        })
    }

    #[tokio::test]
    async fn test_load_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(&calls, Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!handle.is_resolved());

        assert_eq!(handle.wait().await, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_resolved());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_waiters_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(&calls, Duration::from_millis(50));

        let mut waiters = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let handle = handle.clone();
            waiters.spawn(async move { handle.wait().await });
        }

        while let Some(result) = waiters.join_next().await {
            assert_eq!(result.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_waiter_gets_memoized_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(&calls, Duration::ZERO);

        assert_eq!(handle.wait().await, Ok(42));
        assert_eq!(handle.clone().wait().await, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_replayed() {
        let handle: LoadHandle<u32, TestError> =
            LoadHandle::new(|_| async { Err(TestError::Failed) });

        assert_eq!(handle.wait().await, Err(TestError::Failed));
        assert_eq!(handle.wait().await, Err(TestError::Failed));
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_cancel_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(&calls, Duration::from_millis(50));

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_resolved());
        assert_eq!(handle.wait().await, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_load_resolves_with_error() {
        let handle: LoadHandle<u32, TestError> = LoadHandle::new(|_| async {
            let fail = true;
            assert!(!fail, "boom");
            Ok(1)
        });

        assert_eq!(handle.wait().await, Err(TestError::Aborted));
    }

    #[tokio::test]
    async fn test_tickets_are_distinct() {
        let a: LoadHandle<u32, TestError> = LoadHandle::new(|_| async { Ok(1) });
        let b: LoadHandle<u32, TestError> = LoadHandle::new(|_| async { Ok(2) });

        assert_ne!(a.ticket(), b.ticket());
        assert_eq!(a.ticket(), a.clone().ticket());
    }

    #[tokio::test]
    async fn test_load_sees_its_own_ticket() {
        let handle: LoadHandle<Ticket, TestError> = LoadHandle::new(|ticket| async move { Ok(ticket) });
        assert_eq!(handle.wait().await, Ok(handle.ticket()));
    }
}
