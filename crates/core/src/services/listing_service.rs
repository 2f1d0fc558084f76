use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::coin::CoinMarket;
use crate::models::favorite::FavoriteCoin;

/// Column a coin table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    MarketCap,
    Price,
    Change24h,
    Name,
    Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Anything that can appear as a row in a coin table.
///
/// Both the live listing and the favorites snapshot render through the
/// same table, so search and sort work on either.
pub trait CoinRow {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn symbol(&self) -> &str;
    fn current_price(&self) -> Option<f64>;
    fn market_cap(&self) -> Option<f64>;
    fn price_change_percentage_24h(&self) -> Option<f64>;
    fn market_cap_rank(&self) -> Option<u32> {
        None
    }
}

impl CoinRow for CoinMarket {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn symbol(&self) -> &str {
        &self.symbol
    }
    fn current_price(&self) -> Option<f64> {
        self.current_price
    }
    fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }
    fn price_change_percentage_24h(&self) -> Option<f64> {
        self.price_change_percentage_24h
    }
    fn market_cap_rank(&self) -> Option<u32> {
        self.market_cap_rank
    }
}

impl CoinRow for FavoriteCoin {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn symbol(&self) -> &str {
        &self.symbol
    }
    fn current_price(&self) -> Option<f64> {
        self.current_price
    }
    fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }
    fn price_change_percentage_24h(&self) -> Option<f64> {
        self.price_change_percentage_24h
    }
}

/// Search text plus sort order for a coin table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub search: String,
    pub sort: Option<(SortKey, SortDirection)>,
}

impl ListingQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            sort: None,
        }
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }

    /// Header click behaviour: same column flips direction, a new column
    /// starts descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = match self.sort {
            Some((current, dir)) if current == key => Some((key, dir.flipped())),
            _ => Some((key, SortDirection::Descending)),
        };
    }
}

/// Filters and orders coin rows for display. Stateless.
pub struct ListingService;

impl ListingService {
    pub fn new() -> Self {
        Self
    }

    /// Case-insensitive substring match on name or symbol.
    /// An empty (or whitespace) query matches everything.
    pub fn matches<R: CoinRow>(&self, row: &R, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        row.name().to_lowercase().contains(&needle)
            || row.symbol().to_lowercase().contains(&needle)
    }

    /// Rows matching `search`, in their original order.
    pub fn filter<'a, R: CoinRow>(&self, rows: &'a [R], search: &str) -> Vec<&'a R> {
        rows.iter().filter(|r| self.matches(*r, search)).collect()
    }

    /// Stable sort. Rows missing the sort value always go last.
    pub fn sort<R: CoinRow>(&self, rows: &mut [&R], key: SortKey, direction: SortDirection) {
        rows.sort_by(|a, b| compare(*a, *b, key, direction));
    }

    /// Filter then (optionally) sort.
    pub fn apply<'a, R: CoinRow>(&self, rows: &'a [R], query: &ListingQuery) -> Vec<&'a R> {
        let mut out = self.filter(rows, &query.search);
        if let Some((key, direction)) = query.sort {
            self.sort(&mut out, key, direction);
        }
        out
    }
}

impl Default for ListingService {
    fn default() -> Self {
        Self::new()
    }
}

fn compare<R: CoinRow>(a: &R, b: &R, key: SortKey, direction: SortDirection) -> Ordering {
    if key == SortKey::Name {
        let ord = a.name().to_lowercase().cmp(&b.name().to_lowercase());
        return match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
    }

    let value = |r: &R| -> Option<f64> {
        match key {
            SortKey::MarketCap => r.market_cap(),
            SortKey::Price => r.current_price(),
            SortKey::Change24h => r.price_change_percentage_24h(),
            SortKey::Rank => r.market_cap_rank().map(f64::from),
            SortKey::Name => None,
        }
    };

    match (value(a), value(b)) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
