use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::chart::{ChartTimeframe, PricePoint};
use crate::models::coin::{CoinDetail, CoinMarket};

/// Source of coin listings, coin detail and historical prices.
///
/// Implementations hold no session state; every call is an independent
/// request. Swapping the market API means writing one new implementation,
/// the services and front end stay untouched.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Top coins by market capitalisation, priced in `currency`.
    async fn get_top_coins(
        &self,
        currency: &str,
        per_page: u32,
    ) -> Result<Vec<CoinMarket>, CoreError>;

    /// Full detail for one coin id.
    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, CoreError>;

    /// Historical prices for one coin over the given window, oldest first.
    async fn get_market_chart(
        &self,
        id: &str,
        currency: &str,
        timeframe: ChartTimeframe,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
