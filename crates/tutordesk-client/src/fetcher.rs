//! Single-flight request issuing with cooperative cancellation.

use std::future::Future;
use std::sync::Mutex;

use futures_util::future::{AbortHandle, Abortable, Aborted};
use tracing::debug;

use tutordesk_core::{Error, QueryToken, Result};

/// Issues at most one live request per logical stream.
///
/// Starting a new request retires the previous one: its abort handle is
/// triggered before the new request is registered, so an old in-flight
/// fetch can never race a newer one into the result-application path. An
/// aborted request resolves to [`Error::Cancelled`], which callers absorb
/// rather than surface.
#[derive(Default)]
pub struct CancellableFetcher {
    current: Mutex<Option<AbortHandle>>,
}

impl CancellableFetcher {
    /// Create a fetcher with no request in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `request` as the stream's current request, aborting any
    /// previously issued one.
    ///
    /// Registration happens synchronously at call time; the returned future
    /// performs the actual work. If a later `issue` or [`cancel`](Self::cancel)
    /// retires this request before it settles, the future resolves to
    /// [`Error::Cancelled`].
    ///
    /// The returned future owns the wrapped request and does not borrow the
    /// fetcher, so it can be moved into a spawned task.
    pub fn issue<T, F>(
        &self,
        token: QueryToken,
        request: F,
    ) -> impl Future<Output = Result<T>> + use<T, F>
    where
        F: Future<Output = Result<T>>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut current = self.current.lock().unwrap();
            if let Some(previous) = current.replace(handle) {
                previous.abort();
            }
        }
        debug!(%token, "issuing request");

        let wrapped = Abortable::new(request, registration);
        async move {
            match wrapped.await {
                Ok(outcome) => outcome,
                Err(Aborted) => Err(Error::Cancelled),
            }
        }
    }

    /// Abort the in-flight request, if any.
    ///
    /// Idempotent: cancelling an already-settled or already-cancelled
    /// request is a no-op.
    pub fn cancel(&self) {
        if let Some(handle) = self.current.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CancellableFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let in_flight = self.current.lock().unwrap().is_some();
        f.debug_struct("CancellableFetcher")
            .field("in_flight", &in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future;

    #[tokio::test]
    async fn completed_request_resolves_normally() {
        let fetcher = CancellableFetcher::new();
        let result = fetcher
            .issue(QueryToken::new(1), future::ready(Ok(42)))
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn new_request_aborts_previous() {
        let fetcher = CancellableFetcher::new();

        // A request that would never settle on its own.
        let stalled = fetcher.issue(QueryToken::new(1), future::pending::<Result<u32>>());
        let fresh = fetcher.issue(QueryToken::new(2), future::ready(Ok(2u32)));

        let outcome = stalled.await;
        assert!(matches!(outcome, Err(Error::Cancelled)));
        assert_eq!(fresh.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn issued_future_does_not_borrow_the_fetcher() {
        let fetcher = CancellableFetcher::new();
        // Spawning requires 'static: the future must own its state rather
        // than borrow the fetcher it was issued from.
        let guarded = fetcher.issue(QueryToken::new(1), future::ready(Ok(7u32)));
        let handle = tokio::spawn(guarded);
        assert_eq!(handle.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let fetcher = CancellableFetcher::new();
        let result = fetcher
            .issue(QueryToken::new(1), future::ready(Ok(())))
            .await;
        assert!(result.is_ok());

        // Cancelling after settlement, and again after that, must not panic.
        fetcher.cancel();
        fetcher.cancel();
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_request() {
        let fetcher = CancellableFetcher::new();
        let stalled = fetcher.issue(QueryToken::new(1), future::pending::<Result<()>>());
        fetcher.cancel();
        assert!(matches!(stalled.await, Err(Error::Cancelled)));
    }
}
