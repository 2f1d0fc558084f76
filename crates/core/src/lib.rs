pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::{Arc, Mutex};

use models::{
    chart::{ChartSeries, ChartTimeframe},
    coin::{CoinDetail, CoinMarket},
    favorite::FavoriteCoin,
    preferences::PreferenceState,
    settings::Settings,
};
use providers::{coingecko::CoinGeckoProvider, traits::MarketDataProvider};
use services::{
    chart_service::ChartService,
    listing_service::{ListingQuery, ListingService},
    market_service::{fetch_into, lock_resource, RemoteResource, SharedListing},
    preference_store::{PreferenceStore, SubscriptionId},
};
#[cfg(not(target_arch = "wasm32"))]
use services::poller::MarketPoller;
use storage::traits::KeyValueStore;

use errors::CoreError;

/// Main entry point for the Coin Tracker core library.
///
/// Created once at the application root and handed to every view (no
/// global). Owns the preference store, the market data provider and the
/// shared top-coins listing.
#[must_use]
pub struct CoinTracker {
    settings: Settings,
    preferences: PreferenceStore,
    provider: Arc<dyn MarketDataProvider>,
    listing: SharedListing,
    listing_service: ListingService,
    chart_service: ChartService,
}

impl std::fmt::Debug for CoinTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinTracker")
            .field("provider", &self.provider.name())
            .field("preferences", &self.preferences)
            .field("settings", &self.settings)
            .finish()
    }
}

impl CoinTracker {
    /// Build a tracker talking to CoinGecko, with preferences loaded from `storage`.
    pub fn new(settings: Settings, storage: Box<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let provider = Arc::new(CoinGeckoProvider::from_settings(&settings));
        Self::with_provider(settings, storage, provider)
    }

    /// Build a tracker with a custom market data provider.
    pub fn with_provider(
        settings: Settings,
        storage: Box<dyn KeyValueStore>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let preferences = PreferenceStore::load_with_default(storage, &settings.default_currency);
        Ok(Self {
            settings,
            preferences,
            provider,
            listing: Arc::new(Mutex::new(RemoteResource::new())),
            listing_service: ListingService::new(),
            chart_service: ChartService::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn provider(&self) -> Arc<dyn MarketDataProvider> {
        self.provider.clone()
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Latest preference snapshot.
    #[must_use]
    pub fn state(&self) -> &PreferenceState {
        self.preferences.state()
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        self.preferences.currency()
    }

    pub fn set_currency(&mut self, code: &str) {
        self.preferences.set_currency(code);
    }

    pub fn add_favorite(&mut self, coin: FavoriteCoin) {
        self.preferences.add_favorite(coin);
    }

    pub fn remove_favorite(&mut self, id: &str) {
        self.preferences.remove_favorite(id);
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.preferences.is_favorite(id)
    }

    /// Star button in a listing row.
    pub fn toggle_listing_favorite(&mut self, coin: &CoinMarket) -> bool {
        self.preferences.toggle_favorite(FavoriteCoin::from(coin))
    }

    /// Star button on the detail page; snapshots values in the current currency.
    pub fn toggle_detail_favorite(&mut self, detail: &CoinDetail) -> bool {
        let favorite = detail.to_favorite(self.preferences.currency());
        self.preferences.toggle_favorite(favorite)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PreferenceState) + Send + 'static,
    {
        self.preferences.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.preferences.unsubscribe(id)
    }

    /// Favorites matching the query, for the favorites page.
    #[must_use]
    pub fn favorites_view(&self, query: &ListingQuery) -> Vec<&FavoriteCoin> {
        self.listing_service
            .apply(self.preferences.favorites(), query)
    }

    // ── Market listing ──────────────────────────────────────────────

    /// The shared top-coins listing resource.
    pub fn listing(&self) -> SharedListing {
        self.listing.clone()
    }

    /// Fetch the top coins once in the current currency.
    /// Returns whether the response was applied (not superseded).
    pub async fn refresh_listing(&self) -> bool {
        let currency = self.preferences.currency().to_string();
        let fetch = self.provider.get_top_coins(&currency, self.settings.per_page);
        fetch_into(&self.listing, fetch).await
    }

    /// Start refreshing the listing on the configured interval in the
    /// current currency. Drop the returned poller to stop; spawn a new one
    /// after a currency change.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start_polling(&self) -> MarketPoller {
        MarketPoller::from_settings(
            self.provider.clone(),
            self.preferences.currency(),
            &self.settings,
            self.listing.clone(),
        )
    }

    /// Current listing rows matching the query. Empty while nothing has loaded.
    #[must_use]
    pub fn listing_view(&self, query: &ListingQuery) -> Vec<CoinMarket> {
        let listing = lock_resource(&self.listing);
        let rows: Vec<CoinMarket> = match listing.data() {
            Some(rows) => self
                .listing_service
                .apply(rows.as_slice(), query)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        rows
    }

    // ── Coin detail ─────────────────────────────────────────────────

    pub async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, CoreError> {
        self.provider.get_coin_detail(id).await
    }

    /// Price chart for one coin in the current display currency.
    pub async fn get_price_chart(
        &self,
        id: &str,
        timeframe: ChartTimeframe,
    ) -> Result<ChartSeries, CoreError> {
        let currency = self.preferences.currency();
        let points = self
            .provider
            .get_market_chart(id, currency, timeframe)
            .await?;
        Ok(self.chart_service.build_series(&points, currency, timeframe))
    }

    /// Everything the detail page needs: the coin plus its chart.
    /// Either request failing fails the whole page.
    pub async fn load_coin_page(
        &self,
        id: &str,
        timeframe: ChartTimeframe,
    ) -> Result<(CoinDetail, ChartSeries), CoreError> {
        let detail = self.get_coin_detail(id).await?;
        let chart = self.get_price_chart(id, timeframe).await?;
        Ok((detail, chart))
    }

    pub fn chart_service(&self) -> &ChartService {
        &self.chart_service
    }
}
