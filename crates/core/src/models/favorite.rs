use serde::{Deserialize, Serialize};

/// A coin the user has pinned, captured at the moment it was favorited.
///
/// Prices are a snapshot and are never live-updated. Numeric fields are
/// optional because the market API reports `null` for coins without
/// enough trading data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCoin {
    /// Stable coin identifier (e.g., "bitcoin"). Unique within the favorites list.
    pub id: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker symbol as reported by the API, usually lowercase (e.g., "btc")
    pub symbol: String,

    /// Logo URL
    pub image: String,

    pub current_price: Option<f64>,

    pub market_cap: Option<f64>,

    pub price_change_percentage_24h: Option<f64>,
}

impl FavoriteCoin {
    /// Minimal favorite with only identity fields set.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            image: image.into(),
            current_price: None,
            market_cap: None,
            price_change_percentage_24h: None,
        }
    }

    /// Attach the market snapshot values.
    pub fn with_market(
        mut self,
        current_price: Option<f64>,
        market_cap: Option<f64>,
        price_change_percentage_24h: Option<f64>,
    ) -> Self {
        self.current_price = current_price;
        self.market_cap = market_cap;
        self.price_change_percentage_24h = price_change_percentage_24h;
        self
    }
}
