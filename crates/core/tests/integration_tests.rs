use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use coin_tracker_core::errors::CoreError;
use coin_tracker_core::models::chart::{ChartTimeframe, PricePoint};
use coin_tracker_core::models::coin::{CoinDetail, CoinMarket};
use coin_tracker_core::models::settings::Settings;
use coin_tracker_core::providers::traits::MarketDataProvider;
use coin_tracker_core::services::listing_service::{ListingQuery, SortDirection, SortKey};
use coin_tracker_core::services::market_service::{
    lock_resource, FetchView, RemoteResource, FETCH_ERROR_MESSAGE,
};
use coin_tracker_core::services::poller::MarketPoller;
use coin_tracker_core::storage::memory::MemoryStore;
use coin_tracker_core::storage::traits::KeyValueStore;
use coin_tracker_core::CoinTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock Market Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

struct MockMarketProvider {
    listing_calls: AtomicUsize,
    fail_listing: AtomicBool,
    currencies: Mutex<Vec<String>>,
}

impl MockMarketProvider {
    fn new() -> Self {
        Self {
            listing_calls: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
            currencies: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.fail_listing.store(failing, Ordering::SeqCst);
    }

    fn currencies_seen(&self) -> Vec<String> {
        self.currencies.lock().unwrap().clone()
    }
}

fn market(id: &str, name: &str, symbol: &str, price: f64, cap: f64, rank: u32) -> CoinMarket {
    CoinMarket {
        id: id.into(),
        name: name.into(),
        symbol: symbol.into(),
        image: format!("https://img/{id}.png"),
        current_price: Some(price),
        market_cap: Some(cap),
        market_cap_rank: Some(rank),
        total_volume: None,
        price_change_percentage_24h: Some(rank as f64 - 2.0),
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn get_top_coins(
        &self,
        currency: &str,
        per_page: u32,
    ) -> Result<Vec<CoinMarket>, CoreError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.currencies.lock().unwrap().push(currency.to_string());
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(CoreError::RateLimited {
                provider: "Mock".into(),
            });
        }
        let rows = vec![
            market("bitcoin", "Bitcoin", "btc", 43000.0, 8.4e11, 1),
            market("ethereum", "Ethereum", "eth", 3200.0, 3.8e11, 2),
            market("solana", "Solana", "sol", 95.0, 4.1e10, 3),
        ];
        Ok(rows.into_iter().take(per_page as usize).collect())
    }

    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, CoreError> {
        if id != "bitcoin" {
            return Err(CoreError::Api {
                provider: "Mock".into(),
                message: format!("HTTP 404 Not Found while fetching coin {id}"),
            });
        }
        let json = r#"{
            "id": "bitcoin",
            "name": "Bitcoin",
            "symbol": "btc",
            "market_cap_rank": 1,
            "image": {"thumb": "t", "small": "https://img/btc-small.png", "large": "l"},
            "description": {"en": "The first cryptocurrency."},
            "links": {"homepage": ["https://bitcoin.org", ""], "blockchain_site": []},
            "market_data": {
                "current_price": {"usd": 43000.0, "eur": 39500.0},
                "market_cap": {"usd": 8.4e11, "eur": 7.7e11},
                "total_volume": {"usd": 2.1e10},
                "price_change_percentage_24h": 1.75
            }
        }"#;
        Ok(serde_json::from_str(json)?)
    }

    async fn get_market_chart(
        &self,
        _id: &str,
        _currency: &str,
        timeframe: ChartTimeframe,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        Ok((0..timeframe.days())
            .rev()
            .map(|d| PricePoint {
                timestamp: start + chrono::Duration::days(d as i64),
                price: 40000.0 + d as f64 * 100.0,
            })
            .collect())
    }
}

fn tracker_with(provider: Arc<MockMarketProvider>) -> CoinTracker {
    CoinTracker::with_provider(Settings::default(), Box::new(MemoryStore::new()), provider)
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn invalid_settings_are_rejected() {
    let settings = Settings {
        per_page: 0,
        ..Settings::default()
    };
    let result = CoinTracker::with_provider(
        settings,
        Box::new(MemoryStore::new()),
        Arc::new(MockMarketProvider::new()),
    );
    assert!(matches!(result, Err(CoreError::ValidationError(_))));
}

#[test]
fn default_currency_from_settings() {
    let settings = Settings {
        default_currency: "GBP".into(),
        ..Settings::default()
    };
    let tracker = CoinTracker::with_provider(
        settings,
        Box::new(MemoryStore::new()),
        Arc::new(MockMarketProvider::new()),
    )
    .unwrap();
    assert_eq!(tracker.currency(), "GBP");
}

#[test]
fn coingecko_tracker_builds_from_default_settings() {
    let tracker = CoinTracker::new(Settings::default(), Box::new(MemoryStore::new())).unwrap();
    assert_eq!(tracker.provider().name(), "CoinGecko");
    assert_eq!(tracker.currency(), "USD");
}

// ═══════════════════════════════════════════════════════════════════
// Listing
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn listing_is_loading_before_first_fetch() {
    let tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    let listing = tracker.listing();
    assert_eq!(lock_resource(&listing).view(), FetchView::Loading);
    assert!(tracker.listing_view(&ListingQuery::default()).is_empty());
}

#[tokio::test]
async fn refresh_listing_uses_current_currency() {
    let provider = Arc::new(MockMarketProvider::new());
    let mut tracker = tracker_with(provider.clone());
    tracker.set_currency("EUR");

    assert!(tracker.refresh_listing().await);
    assert_eq!(provider.currencies_seen(), vec!["EUR".to_string()]);

    let rows = tracker.listing_view(&ListingQuery::default());
    let ids: Vec<&str> = rows.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["bitcoin", "ethereum", "solana"]);
}

#[tokio::test]
async fn listing_view_applies_search_and_sort() {
    let tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    tracker.refresh_listing().await;

    let by_price = tracker.listing_view(
        &ListingQuery::default().sorted_by(SortKey::Price, SortDirection::Ascending),
    );
    assert_eq!(by_price[0].id, "solana");

    let searched = tracker.listing_view(&ListingQuery::search("ETH"));
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, "ethereum");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_rows() {
    let provider = Arc::new(MockMarketProvider::new());
    let tracker = tracker_with(provider.clone());
    tracker.refresh_listing().await;

    provider.set_failing(true);
    tracker.refresh_listing().await;

    let listing = tracker.listing();
    let resource = lock_resource(&listing);
    assert_eq!(resource.error(), Some(FETCH_ERROR_MESSAGE));
    assert_eq!(resource.data().map(Vec::len), Some(3));
    drop(resource);
    assert_eq!(tracker.listing_view(&ListingQuery::default()).len(), 3);
}

// ═══════════════════════════════════════════════════════════════════
// Favorites through the tracker
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn toggle_listing_favorite_round_trip() {
    let mut tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    tracker.refresh_listing().await;
    let rows = tracker.listing_view(&ListingQuery::default());

    assert!(tracker.toggle_listing_favorite(&rows[1]));
    assert!(tracker.is_favorite("ethereum"));
    assert_eq!(tracker.state().favorites[0].current_price, Some(3200.0));

    assert!(!tracker.toggle_listing_favorite(&rows[1]));
    assert!(!tracker.is_favorite("ethereum"));
}

#[tokio::test]
async fn detail_favorite_uses_display_currency_snapshot() {
    let mut tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    tracker.set_currency("EUR");
    let detail = tracker.get_coin_detail("bitcoin").await.unwrap();

    assert!(tracker.toggle_detail_favorite(&detail));
    let fav = &tracker.state().favorites[0];
    assert_eq!(fav.current_price, Some(39500.0));
    assert_eq!(fav.market_cap, Some(7.7e11));
    assert_eq!(fav.image, "https://img/btc-small.png");
    assert_eq!(fav.price_change_percentage_24h, Some(1.75));
}

#[test]
fn favorites_view_filters_snapshot() {
    let mut tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    tracker.add_favorite(market("bitcoin", "Bitcoin", "btc", 1.0, 3.0, 1).into());
    tracker.add_favorite(market("solana", "Solana", "sol", 2.0, 1.0, 3).into());

    let all = tracker.favorites_view(
        &ListingQuery::default().sorted_by(SortKey::MarketCap, SortDirection::Ascending),
    );
    assert_eq!(all[0].id, "solana");

    let searched = tracker.favorites_view(&ListingQuery::search("btc"));
    assert_eq!(searched.len(), 1);

    tracker.remove_favorite("bitcoin");
    assert!(tracker.favorites_view(&ListingQuery::search("btc")).is_empty());
}

#[test]
fn subscribers_see_tracker_mutations() {
    let mut tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = tracker.subscribe(move |state| sink.lock().unwrap().push(state.currency.clone()));

    tracker.set_currency("JPY");
    assert!(tracker.unsubscribe(id));
    tracker.set_currency("INR");

    assert_eq!(*seen.lock().unwrap(), vec!["JPY".to_string()]);
}

#[test]
fn preferences_survive_restart_on_disk() {
    use coin_tracker_core::storage::file::FileStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coin-tracker").join("preferences.json");
    {
        let mut tracker = CoinTracker::with_provider(
            Settings::default(),
            Box::new(FileStore::open(&path).unwrap()),
            Arc::new(MockMarketProvider::new()),
        )
        .unwrap();
        tracker.set_currency("EUR");
        tracker.add_favorite(market("bitcoin", "Bitcoin", "btc", 1.0, 2.0, 1).into());
    }

    let tracker = CoinTracker::with_provider(
        Settings::default(),
        Box::new(FileStore::open(&path).unwrap()),
        Arc::new(MockMarketProvider::new()),
    )
    .unwrap();
    assert_eq!(tracker.currency(), "EUR");
    assert!(tracker.is_favorite("bitcoin"));
}

// ═══════════════════════════════════════════════════════════════════
// Coin page
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn load_coin_page_returns_detail_and_chart() {
    let tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    let (detail, chart) = tracker
        .load_coin_page("bitcoin", ChartTimeframe::Week)
        .await
        .unwrap();

    assert_eq!(detail.description_en(), Some("The first cryptocurrency."));
    assert_eq!(detail.links.primary_homepage(), Some("https://bitcoin.org"));
    assert_eq!(chart.label, "Price in USD");
    assert_eq!(chart.points.len(), 7);
    assert_eq!(chart.points[0].label, "2025-01-15");
    assert!(chart
        .points
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));

    let change = tracker.chart_service().change_percent(&chart).unwrap();
    assert!(change > 0.0);
}

#[tokio::test]
async fn load_coin_page_unknown_coin_fails() {
    let tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    let err = tracker
        .load_coin_page("nope", ChartTimeframe::Day)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Api { .. }));
}

#[tokio::test]
async fn chart_label_follows_display_currency() {
    let mut tracker = tracker_with(Arc::new(MockMarketProvider::new()));
    tracker.set_currency("gbp");
    let chart = tracker
        .get_price_chart("bitcoin", ChartTimeframe::Day)
        .await
        .unwrap();
    assert_eq!(chart.label, "Price in GBP");
    assert_eq!(chart.points.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Polling
// ═══════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn poller_fetches_immediately_then_on_interval() {
    let provider = Arc::new(MockMarketProvider::new());
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    let poller = MarketPoller::spawn(
        provider.clone(),
        "USD",
        2,
        Duration::from_secs(60),
        listing.clone(),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(provider.calls(), 1);
    assert_eq!(lock_resource(&listing).data().map(Vec::len), Some(2));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(provider.calls(), 2);

    assert_eq!(poller.currency(), "USD");
    assert_eq!(poller.interval(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn cancelled_poller_stops_ticking() {
    let provider = Arc::new(MockMarketProvider::new());
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    let poller = MarketPoller::spawn(
        provider.clone(),
        "EUR",
        50,
        Duration::from_secs(60),
        listing,
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    poller.cancel();
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(provider.calls(), 1);
    assert!(poller.is_finished());
}

#[tokio::test(start_paused = true)]
async fn dropped_poller_stops_ticking() {
    let provider = Arc::new(MockMarketProvider::new());
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    {
        let _poller = MarketPoller::spawn(
            provider.clone(),
            "USD",
            50,
            Duration::from_secs(60),
            listing,
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn tracker_polling_writes_shared_listing() {
    let provider = Arc::new(MockMarketProvider::new());
    let mut tracker = tracker_with(provider.clone());
    tracker.set_currency("INR");

    let poller = tracker.start_polling();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(provider.currencies_seen(), vec!["INR".to_string()]);
    assert_eq!(tracker.listing_view(&ListingQuery::default()).len(), 3);
    assert_eq!(poller.interval(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn poll_failure_surfaces_generic_message() {
    let provider = Arc::new(MockMarketProvider::new());
    provider.set_failing(true);
    let tracker = tracker_with(provider.clone());

    let _poller = tracker.start_polling();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let listing = tracker.listing();
    assert_eq!(
        lock_resource(&listing).view(),
        FetchView::Failed(FETCH_ERROR_MESSAGE)
    );
}

// ═══════════════════════════════════════════════════════════════════
// Polling — slow and abandoned fetches
// ═══════════════════════════════════════════════════════════════════

/// Answers the n-th listing call after `delays[n]` (no delay past the end)
/// with a single row whose id is `gen<n+1>`.
struct ScriptedProvider {
    calls: AtomicUsize,
    delays: Vec<Duration>,
}

impl ScriptedProvider {
    fn new(delays: Vec<Duration>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delays,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn get_top_coins(
        &self,
        _currency: &str,
        _per_page: u32,
    ) -> Result<Vec<CoinMarket>, CoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(n) {
            tokio::time::sleep(*delay).await;
        }
        let id = format!("gen{}", n + 1);
        Ok(vec![market(&id, &id, &id, 1.0, 1.0, 1)])
    }

    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, CoreError> {
        Err(CoreError::Api {
            provider: "Scripted".into(),
            message: format!("no detail for {id}"),
        })
    }

    async fn get_market_chart(
        &self,
        _id: &str,
        _currency: &str,
        _timeframe: ChartTimeframe,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Ok(Vec::new())
    }
}

fn listing_ids(listing: &Arc<Mutex<RemoteResource<Vec<CoinMarket>>>>) -> Option<Vec<String>> {
    lock_resource(listing)
        .data()
        .map(|rows| rows.iter().map(|c| c.id.clone()).collect())
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_does_not_block_next_tick_and_is_discarded() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_secs(90)]));
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    let _poller = MarketPoller::spawn(
        provider.clone(),
        "USD",
        50,
        Duration::from_secs(60),
        listing.clone(),
    );

    // The second tick fires while the first fetch is still pending.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(provider.calls(), 2);
    assert_eq!(listing_ids(&listing), Some(vec!["gen2".to_string()]));
    assert!(!lock_resource(&listing).is_loading());

    // The first fetch finishes at 90 s and must not overwrite newer data.
    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(provider.calls(), 2);
    assert_eq!(listing_ids(&listing), Some(vec!["gen2".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_fetch_keeps_previous_rows_visible() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Duration::ZERO,
        Duration::from_secs(3600),
    ]));
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    let poller = MarketPoller::spawn(
        provider.clone(),
        "USD",
        50,
        Duration::from_secs(60),
        listing.clone(),
    );

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(provider.calls(), 2);
    assert!(lock_resource(&listing).is_loading());

    poller.cancel();
    let resource = lock_resource(&listing);
    assert!(!resource.is_loading());
    assert!(matches!(resource.view(), FetchView::Ready(rows) if rows[0].id == "gen1"));
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_during_fetch_clears_loading() {
    let provider = Arc::new(ScriptedProvider::new(vec![Duration::from_secs(3600)]));
    let listing = Arc::new(Mutex::new(RemoteResource::new()));
    {
        let _poller = MarketPoller::spawn(
            provider.clone(),
            "USD",
            50,
            Duration::from_secs(60),
            listing.clone(),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(lock_resource(&listing).is_loading());
    }
    tokio::time::sleep(Duration::from_secs(7200)).await;
    let resource = lock_resource(&listing);
    assert!(!resource.is_loading());
    assert!(resource.data().is_none());
}

#[test]
fn corrupted_preferences_file_starts_with_defaults() {
    use coin_tracker_core::storage::file::FileStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, r#"{"currency":"EUR","favor"#).unwrap();

    let mut tracker = CoinTracker::with_provider(
        Settings::default(),
        Box::new(FileStore::open(&path).unwrap()),
        Arc::new(MockMarketProvider::new()),
    )
    .unwrap();
    assert_eq!(tracker.currency(), "USD");
    assert!(tracker.state().favorites.is_empty());

    tracker.set_currency("JPY");
    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("currency").unwrap().as_deref(), Some("JPY"));
}
