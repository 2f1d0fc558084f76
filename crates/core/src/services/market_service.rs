use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::CoreError;
use crate::models::coin::CoinMarket;

/// Message shown to the user whenever a market data request fails.
/// The underlying error is logged, not displayed.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch cryptocurrency data";

/// The top-coins listing, shared between whoever refreshes it and the views.
pub type SharedListing = Arc<Mutex<RemoteResource<Vec<CoinMarket>>>>;

/// Identifies one issued request. Only the most recently issued ticket may
/// write into the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// What a view should draw for a remote resource right now.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchView<'a, T> {
    Loading,
    Failed(&'a str),
    Ready(&'a T),
}

/// Loading / error / data state of one remotely fetched value, e.g. the
/// top-coins listing or a coin's detail.
///
/// Requests are numbered by a monotonic generation. When several requests
/// overlap (a slow poll response arriving after a newer tick started), only
/// the response for the latest issued ticket is applied; older ones are
/// discarded.
#[derive(Debug, Clone)]
pub struct RemoteResource<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    latest: u64,
}

impl<T> Default for RemoteResource<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            latest: 0,
        }
    }
}

impl<T> RemoteResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request: issue the next ticket and mark the resource loading.
    pub fn begin(&mut self) -> RequestTicket {
        self.latest += 1;
        self.loading = true;
        RequestTicket(self.latest)
    }

    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// Returns `false` (and changes nothing) if a newer request has been
    /// issued since. On failure the last good data is kept and the generic
    /// [`FETCH_ERROR_MESSAGE`] is exposed.
    pub fn complete(&mut self, ticket: RequestTicket, result: Result<T, CoreError>) -> bool {
        if ticket.0 != self.latest {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest,
                "discarding stale response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "market data fetch failed");
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Give up on the request identified by `ticket` without a result.
    ///
    /// If it is still the latest, loading is cleared so the view falls back
    /// to the last data or error. Returns whether anything changed.
    pub fn abandon(&mut self, ticket: RequestTicket) -> bool {
        if ticket.0 != self.latest || !self.loading {
            return false;
        }
        self.loading = false;
        true
    }

    /// Whether `ticket` is still the latest issued request.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Render decision: loading first, then error, then data.
    /// A resource that has never been requested reports `Loading`.
    pub fn view(&self) -> FetchView<'_, T> {
        if self.loading {
            return FetchView::Loading;
        }
        if let Some(err) = &self.error {
            return FetchView::Failed(err);
        }
        match &self.data {
            Some(data) => FetchView::Ready(data),
            None => FetchView::Loading,
        }
    }

    /// Forget data and error. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.latest += 1;
        self.data = None;
        self.error = None;
        self.loading = false;
    }
}

/// Lock a shared resource, recovering from a poisoned mutex.
pub fn lock_resource<T>(resource: &Mutex<RemoteResource<T>>) -> MutexGuard<'_, RemoteResource<T>> {
    resource.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run one request against a shared resource: issue a ticket, await the
/// fetch without holding the lock, then apply the result if still current.
/// Returns whether the result was applied.
pub async fn fetch_into<T, F>(resource: &Mutex<RemoteResource<T>>, fetch: F) -> bool
where
    F: Future<Output = Result<T, CoreError>>,
{
    let ticket = lock_resource(resource).begin();
    let result = fetch.await;
    lock_resource(resource).complete(ticket, result)
}
