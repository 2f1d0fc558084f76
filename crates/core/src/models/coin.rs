use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::favorite::FavoriteCoin;

/// One row of the top-coins listing (`/coins/markets`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Logo URL
    pub image: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

impl From<&CoinMarket> for FavoriteCoin {
    fn from(coin: &CoinMarket) -> Self {
        FavoriteCoin {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.clone(),
            image: coin.image.clone(),
            current_price: coin.current_price,
            market_cap: coin.market_cap,
            price_change_percentage_24h: coin.price_change_percentage_24h,
        }
    }
}

impl From<CoinMarket> for FavoriteCoin {
    fn from(coin: CoinMarket) -> Self {
        FavoriteCoin {
            id: coin.id,
            name: coin.name,
            symbol: coin.symbol,
            image: coin.image,
            current_price: coin.current_price,
            market_cap: coin.market_cap,
            price_change_percentage_24h: coin.price_change_percentage_24h,
        }
    }
}

/// Logo URLs in the three sizes the API provides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinImage {
    pub thumb: String,
    pub small: String,
    pub large: String,
}

/// External links shown on the detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinLinks {
    pub homepage: Vec<String>,
    pub blockchain_site: Vec<String>,
    pub subreddit_url: Option<String>,
}

impl CoinLinks {
    /// First non-empty homepage URL.
    pub fn primary_homepage(&self) -> Option<&str> {
        self.homepage
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Explorer URLs with the API's empty placeholders removed.
    pub fn explorers(&self) -> Vec<&str> {
        self.blockchain_site
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Market statistics keyed by lowercase currency code ("usd", "eur", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketData {
    pub current_price: HashMap<String, Option<f64>>,
    pub market_cap: HashMap<String, Option<f64>>,
    pub total_volume: HashMap<String, Option<f64>>,
    /// All-time high per currency.
    pub ath: HashMap<String, Option<f64>>,
    /// All-time low per currency.
    pub atl: HashMap<String, Option<f64>>,
    pub price_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    /// `None` means the coin has no supply cap.
    pub max_supply: Option<f64>,
}

impl MarketData {
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.current_price.get(&currency.to_lowercase()).copied().flatten()
    }

    pub fn market_cap_in(&self, currency: &str) -> Option<f64> {
        self.market_cap.get(&currency.to_lowercase()).copied().flatten()
    }

    pub fn volume_in(&self, currency: &str) -> Option<f64> {
        self.total_volume.get(&currency.to_lowercase()).copied().flatten()
    }

    pub fn ath_in(&self, currency: &str) -> Option<f64> {
        self.ath.get(&currency.to_lowercase()).copied().flatten()
    }

    pub fn atl_in(&self, currency: &str) -> Option<f64> {
        self.atl.get(&currency.to_lowercase()).copied().flatten()
    }
}

/// Full detail for a single coin (`/coins/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub image: CoinImage,
    /// Descriptions keyed by language code; see [`CoinDetail::description_en`].
    #[serde(default)]
    pub description: HashMap<String, String>,
    #[serde(default)]
    pub links: CoinLinks,
    #[serde(default)]
    pub market_data: MarketData,
}

impl CoinDetail {
    /// English description, if the API has one.
    pub fn description_en(&self) -> Option<&str> {
        self.description
            .get("en")
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// The first three sentences of the English description, for the
    /// "About" block. Sentences are split on `". "`.
    pub fn description_summary(&self) -> Option<String> {
        let text = self.description_en()?.trim();
        let mut summary = text.split(". ").take(3).collect::<Vec<_>>().join(". ");
        if !summary.ends_with('.') {
            summary.push('.');
        }
        Some(summary)
    }

    /// Snapshot this coin as a favorite, using values in the display currency.
    pub fn to_favorite(&self, currency: &str) -> FavoriteCoin {
        FavoriteCoin {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            image: self.image.small.clone(),
            current_price: self.market_data.price_in(currency),
            market_cap: self.market_data.market_cap_in(currency),
            price_change_percentage_24h: self.market_data.price_change_percentage_24h,
        }
    }
}
