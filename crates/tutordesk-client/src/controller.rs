//! Pagination/filter/search state machine for one list screen.
//!
//! A [`ListController`] owns the query state for a single resource screen
//! and publishes its lifecycle through a watch channel: `Fetching` at
//! dispatch, `Settled` or `Failed` at resolution. Results are applied only
//! when their query token still matches the controller's current token, so
//! a slow response for an old query can never overwrite a fast response
//! for a new one.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use tutordesk_core::{Error, ListLoader, ListResult, QueryDescriptor, QueryError, QueryToken, Result};

use crate::fetcher::CancellableFetcher;

/// Quiet interval after the last filter/search edit before a fetch is
/// dispatched. Page changes and explicit submits bypass it.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Lifecycle of a list screen.
///
/// Consumers subscribe via [`ListController::subscribe`]; the transitions
/// are the fetch-start/settle/fail signals a toast or spinner hooks into.
#[derive(Debug, Clone)]
pub enum ListState<T> {
    /// Nothing has been dispatched yet.
    Idle,
    /// The query tagged with this token is in flight.
    Fetching(QueryToken),
    /// The query settled with a page of results.
    Settled(QueryToken, ListResult<T>),
    /// The query failed; the error is display-ready.
    Failed(QueryToken, Error),
}

impl<T> ListState<T> {
    /// True while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(self, ListState::Fetching(_))
    }

    /// The token of the query this state belongs to, if any.
    pub fn token(&self) -> Option<QueryToken> {
        match self {
            ListState::Idle => None,
            ListState::Fetching(token)
            | ListState::Settled(token, _)
            | ListState::Failed(token, _) => Some(*token),
        }
    }

    /// The settled result, if this state carries one.
    pub fn result(&self) -> Option<&ListResult<T>> {
        match self {
            ListState::Settled(_, result) => Some(result),
            _ => None,
        }
    }

    /// The failure, if this state carries one.
    pub fn error(&self) -> Option<&Error> {
        match self {
            ListState::Failed(_, error) => Some(error),
            _ => None,
        }
    }
}

/// State machine for one paginated, filterable list screen.
///
/// Cheap to clone; clones share the same state. Methods that dispatch
/// fetches must be called within a Tokio runtime.
pub struct ListController<T, L> {
    inner: Arc<ControllerInner<T, L>>,
}

struct ControllerInner<T, L> {
    loader: L,
    fetcher: CancellableFetcher,
    /// The highest token handed out; only responses tagged with this value
    /// may be applied.
    latest: AtomicU64,
    /// Last observed page count, floored at 1 so an empty list still
    /// permits refetching page 1. Zero means no total is known yet.
    total_pages_hint: AtomicU32,
    descriptor: Mutex<QueryDescriptor>,
    debounce: Duration,
    pending_edit: Mutex<Option<JoinHandle<()>>>,
    state_tx: watch::Sender<ListState<T>>,
}

impl<T, L> Clone for ListController<T, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, L> ListController<T, L>
where
    T: Clone + Send + Sync + 'static,
    L: ListLoader<T> + 'static,
{
    /// Create a controller with the default debounce interval.
    pub fn new(loader: L, descriptor: QueryDescriptor) -> Self {
        Self::with_debounce(loader, descriptor, DEFAULT_DEBOUNCE)
    }

    /// Create a controller with a custom debounce interval.
    pub fn with_debounce(loader: L, descriptor: QueryDescriptor, debounce: Duration) -> Self {
        let (state_tx, _) = watch::channel(ListState::Idle);
        Self {
            inner: Arc::new(ControllerInner {
                loader,
                fetcher: CancellableFetcher::new(),
                latest: AtomicU64::new(0),
                total_pages_hint: AtomicU32::new(0),
                descriptor: Mutex::new(descriptor),
                debounce,
                pending_edit: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.inner.state_tx.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> ListState<T> {
        self.inner.state_tx.borrow().clone()
    }

    /// Returns a copy of the current query descriptor.
    pub fn descriptor(&self) -> QueryDescriptor {
        self.inner.descriptor.lock().unwrap().clone()
    }

    /// Jump to a page and fetch immediately (no debounce).
    ///
    /// # Errors
    ///
    /// Rejects page 0 always, and pages beyond the last known page once a
    /// total is available; in both cases no network call is made and the
    /// current state is untouched.
    pub fn set_page(&self, page: u32) -> Result<()> {
        if page == 0 {
            return Err(QueryError::PageZero.into());
        }
        let hint = self.inner.total_pages_hint.load(Ordering::SeqCst);
        if hint != 0 && page > hint {
            return Err(QueryError::PageOutOfRange {
                page,
                total_pages: hint,
            }
            .into());
        }

        self.cancel_pending_edit();
        self.update_descriptor(|d| d.with_page(page));
        self.dispatch();
        Ok(())
    }

    /// Update the free-text search and schedule a debounced fetch.
    ///
    /// Resets to page 1: a changed search invalidates the old page count.
    pub fn set_search(&self, search: impl Into<String>) {
        self.update_descriptor(|d| d.with_search(search).with_page(1));
        self.schedule_debounced();
    }

    /// Set a field filter and schedule a debounced fetch. Resets to page 1.
    pub fn set_filter(&self, field: impl Into<String>, value: impl Into<String>) {
        self.update_descriptor(|d| d.with_filter(field, value).with_page(1));
        self.schedule_debounced();
    }

    /// Remove a field filter and schedule a debounced fetch. Resets to page 1.
    pub fn clear_filter(&self, field: &str) {
        self.update_descriptor(|d| d.without_filter(field).with_page(1));
        self.schedule_debounced();
    }

    /// Dispatch the current query immediately, bypassing any pending
    /// debounce. This is also the user-initiated retry after a failure.
    pub fn submit(&self) {
        self.cancel_pending_edit();
        self.dispatch();
    }

    fn update_descriptor(&self, change: impl FnOnce(QueryDescriptor) -> QueryDescriptor) {
        let mut descriptor = self.inner.descriptor.lock().unwrap();
        let updated = change(descriptor.clone());
        *descriptor = updated;
    }

    /// Restart the quiet-interval timer; only the last edit in a burst
    /// actually dispatches.
    fn schedule_debounced(&self) {
        let mut pending = self.inner.pending_edit.lock().unwrap();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let controller = self.clone();
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(controller.inner.debounce).await;
            controller.dispatch();
        }));
    }

    fn cancel_pending_edit(&self) {
        if let Some(previous) = self.inner.pending_edit.lock().unwrap().take() {
            previous.abort();
        }
    }

    /// Allocate a fresh token, retire the in-flight request, and fetch.
    fn dispatch(&self) {
        let token = QueryToken::new(self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1);
        let descriptor = self.inner.descriptor.lock().unwrap().clone();
        debug!(%token, resource = descriptor.resource(), page = descriptor.page(), "dispatching fetch");

        self.inner
            .state_tx
            .send_modify(|state| *state = ListState::Fetching(token));

        let loader = self.clone();
        let request = async move { loader.inner.loader.load(&descriptor).await };
        // Register with the fetcher synchronously so the previous request
        // is retired before this one can run.
        let guarded = self.inner.fetcher.issue(token, request);

        let controller = self.clone();
        tokio::spawn(async move {
            let outcome = guarded.await;
            controller.apply(token, outcome);
        });
    }

    /// Apply a resolution iff its token is still current.
    fn apply(&self, token: QueryToken, outcome: Result<ListResult<T>>) {
        if matches!(outcome, Err(Error::Cancelled)) {
            // A newer dispatch already owns the state; nothing to report.
            debug!(%token, "request superseded");
            return;
        }

        let hint = outcome
            .as_ref()
            .ok()
            .map(|result| result.total_pages().max(1));

        let mut applied = false;
        self.inner.state_tx.send_modify(|state| {
            // The token check and the write happen under the channel's
            // internal lock, so a concurrent dispatch cannot interleave.
            if self.inner.latest.load(Ordering::SeqCst) != token.value() {
                debug!(%token, "dropping stale response");
                return;
            }
            applied = true;
            *state = match outcome {
                Ok(result) => ListState::Settled(token, result),
                Err(error) => ListState::Failed(token, error),
            };
        });

        if applied {
            if let Some(hint) = hint {
                self.inner.total_pages_hint.store(hint, Ordering::SeqCst);
            }
        }
    }
}

impl<T, L> std::fmt::Debug for ListController<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("latest", &self.inner.latest.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NeverLoader;

    #[async_trait]
    impl ListLoader<String> for NeverLoader {
        async fn load(&self, _query: &QueryDescriptor) -> Result<ListResult<String>> {
            futures_util::future::pending().await
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let controller = ListController::new(NeverLoader, QueryDescriptor::new("students"));
        assert!(matches!(controller.state(), ListState::Idle));
        assert_eq!(controller.descriptor().page(), 1);
    }

    #[tokio::test]
    async fn page_zero_rejected_before_any_fetch() {
        let controller = ListController::new(NeverLoader, QueryDescriptor::new("students"));
        let err = controller.set_page(0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidQuery(QueryError::PageZero)
        ));
        // State untouched: no Fetching transition happened.
        assert!(matches!(controller.state(), ListState::Idle));
    }

    #[tokio::test]
    async fn submit_enters_fetching() {
        let controller = ListController::new(NeverLoader, QueryDescriptor::new("students"));
        controller.submit();
        assert!(controller.state().is_fetching());
        assert_eq!(controller.state().token(), Some(QueryToken::new(1)));
    }
}
