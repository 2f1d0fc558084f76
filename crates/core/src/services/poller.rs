use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::market_service::{lock_resource, RequestTicket, SharedListing};
use crate::models::settings::Settings;
use crate::providers::traits::MarketDataProvider;

/// Refreshes the top-coins listing on a repeating timer.
///
/// The first fetch starts immediately, then one per `interval`. Each tick's
/// fetch runs as its own task so a slow response never delays the timer;
/// when responses overlap, the resource's generation guard keeps only the
/// newest. Dropping the poller (or calling [`MarketPoller::cancel`]) stops
/// the timer and aborts fetches still in flight; an aborted fetch no longer
/// leaves the listing marked as loading.
///
/// The currency is fixed for the poller's lifetime. When the user picks a
/// new display currency, drop this poller and spawn another.
///
/// Must be spawned from within a tokio runtime.
#[derive(Debug)]
pub struct MarketPoller {
    handle: JoinHandle<()>,
    listing: SharedListing,
    last_ticket: Arc<Mutex<Option<RequestTicket>>>,
    currency: String,
    interval: Duration,
}

impl MarketPoller {
    pub fn spawn(
        provider: Arc<dyn MarketDataProvider>,
        currency: impl Into<String>,
        per_page: u32,
        interval: Duration,
        listing: SharedListing,
    ) -> Self {
        let currency = currency.into();
        let last_ticket = Arc::new(Mutex::new(None));
        let handle = tokio::spawn(run(
            provider,
            currency.clone(),
            per_page,
            interval,
            listing.clone(),
            last_ticket.clone(),
        ));
        tracing::info!(currency = %currency, interval_secs = interval.as_secs(), "market polling started");
        Self {
            handle,
            listing,
            last_ticket,
            currency,
            interval,
        }
    }

    /// Spawn with page size and interval taken from `settings`.
    pub fn from_settings(
        provider: Arc<dyn MarketDataProvider>,
        currency: impl Into<String>,
        settings: &Settings,
        listing: SharedListing,
    ) -> Self {
        Self::spawn(
            provider,
            currency,
            settings.per_page,
            Duration::from_secs(settings.poll_interval_secs),
            listing,
        )
    }

    /// The resource this poller writes into.
    pub fn listing(&self) -> SharedListing {
        self.listing.clone()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop polling. No further ticks are scheduled.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            tracing::info!(currency = %self.currency, "market polling cancelled");
        }
        self.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn stop(&self) {
        self.handle.abort();
        let last = *self.last_ticket.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ticket) = last {
            if lock_resource(&self.listing).abandon(ticket) {
                tracing::debug!(ticket = ticket.generation(), "abandoned in-flight poll");
            }
        }
    }
}

impl Drop for MarketPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    provider: Arc<dyn MarketDataProvider>,
    currency: String,
    per_page: u32,
    interval: Duration,
    listing: SharedListing,
    last_ticket: Arc<Mutex<Option<RequestTicket>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Dropped together with this task, which aborts every in-flight fetch.
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ticket = lock_resource(&listing).begin();
                *last_ticket.lock().unwrap_or_else(|e| e.into_inner()) = Some(ticket);

                let provider = provider.clone();
                let currency = currency.clone();
                let listing = listing.clone();
                in_flight.spawn(async move {
                    let result = provider.get_top_coins(&currency, per_page).await;
                    if !lock_resource(&listing).complete(ticket, result) {
                        tracing::debug!(currency = %currency, "poll response superseded");
                    }
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}
