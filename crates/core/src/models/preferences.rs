use serde::{Deserialize, Serialize};

use super::favorite::FavoriteCoin;

/// Display currency used when nothing has been persisted.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Currencies offered by the currency selector.
pub const SUPPORTED_CURRENCIES: [&str; 5] = ["USD", "EUR", "GBP", "JPY", "INR"];

/// Whether `code` is one of the selectable display currencies (case-insensitive).
pub fn is_supported_currency(code: &str) -> bool {
    SUPPORTED_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
}

/// The user's display currency and favorited coins.
///
/// Only [`crate::services::preference_store::PreferenceStore`] mutates this;
/// views receive read-only snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceState {
    /// Display currency code. Never empty.
    pub currency: String,

    /// Favorites in the order they were added. Unique by `id`.
    pub favorites: Vec<FavoriteCoin>,
}

impl Default for PreferenceState {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            favorites: Vec::new(),
        }
    }
}

impl PreferenceState {
    /// Whether a favorite with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f.id == id)
    }
}
