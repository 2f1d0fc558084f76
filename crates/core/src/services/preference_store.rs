use crate::models::favorite::FavoriteCoin;
use crate::models::preferences::{PreferenceState, DEFAULT_CURRENCY};
use crate::storage::traits::KeyValueStore;

/// Storage key for the display currency (raw string value).
pub const CURRENCY_KEY: &str = "currency";

/// Storage key for the favorites list (JSON array of [`FavoriteCoin`]).
pub const FAVORITES_KEY: &str = "favorites";

/// Handle returned by [`PreferenceStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PreferenceState) + Send>;

/// Single source of truth for the display currency and the favorites list.
///
/// - **Load**: seeded once from a [`KeyValueStore`]; missing or unreadable
///   values fall back to defaults without surfacing an error.
/// - **Mutate**: `set_currency`, `add_favorite`, `remove_favorite`. Each
///   change is written through to storage synchronously, then every
///   subscriber is called with the new snapshot before the method returns.
/// - **Query**: `is_favorite` and the accessors always reflect the most
///   recent mutation.
///
/// None of the operations can fail. Storage write errors are logged and the
/// in-memory state still advances, so the session keeps working when
/// persistence is unavailable.
pub struct PreferenceStore {
    state: PreferenceState,
    storage: Box<dyn KeyValueStore>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("currency", &self.state.currency)
            .field("favorites", &self.state.favorites.len())
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

impl PreferenceStore {
    /// Load preferences from `storage`, defaulting the currency to USD.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        Self::load_with_default(storage, DEFAULT_CURRENCY)
    }

    /// Load preferences from `storage`, using `default_currency` when no
    /// currency has been persisted.
    pub fn load_with_default(storage: Box<dyn KeyValueStore>, default_currency: &str) -> Self {
        let currency = match storage.get(CURRENCY_KEY) {
            Ok(Some(code)) if !code.trim().is_empty() => code,
            Ok(_) => default_currency.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted currency, using default");
                default_currency.to_string()
            }
        };
        let currency = if currency.trim().is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            currency
        };

        let favorites = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => parse_favorites(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted favorites, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(
            currency = %currency,
            favorites = favorites.len(),
            "preference store loaded"
        );

        Self {
            state: PreferenceState {
                currency,
                favorites,
            },
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The latest snapshot.
    #[must_use]
    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.state.currency
    }

    #[must_use]
    pub fn favorites(&self) -> &[FavoriteCoin] {
        &self.state.favorites
    }

    /// Whether `id` is currently a favorite.
    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.state.contains(id)
    }

    /// Read-only access to the backing store.
    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    /// Drop the in-memory state and hand back the backing store.
    pub fn into_storage(self) -> Box<dyn KeyValueStore> {
        self.storage
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Change the display currency.
    ///
    /// Any code is accepted; limiting choices to the supported set is the
    /// selector's job. An empty code is ignored so the currency never
    /// becomes blank.
    pub fn set_currency(&mut self, code: &str) {
        if code.trim().is_empty() {
            tracing::debug!("ignoring empty currency code");
            return;
        }
        self.state.currency = code.to_string();
        if let Err(e) = self.storage.set(CURRENCY_KEY, code) {
            tracing::warn!(error = %e, "failed to persist currency");
        }
        self.notify();
    }

    /// Add a favorite. Adding an id that is already present changes nothing.
    pub fn add_favorite(&mut self, coin: FavoriteCoin) {
        if self.state.contains(&coin.id) {
            return;
        }
        self.state.favorites.push(coin);
        self.persist_favorites();
        self.notify();
    }

    /// Remove the favorite with this id. Absent ids are a no-op.
    pub fn remove_favorite(&mut self, id: &str) {
        let before = self.state.favorites.len();
        self.state.favorites.retain(|f| f.id != id);
        if self.state.favorites.len() == before {
            return;
        }
        self.persist_favorites();
        self.notify();
    }

    /// Add the coin if it is not a favorite, remove it otherwise.
    /// Returns whether the coin is a favorite afterwards.
    pub fn toggle_favorite(&mut self, coin: FavoriteCoin) -> bool {
        if self.is_favorite(&coin.id) {
            self.remove_favorite(&coin.id);
            false
        } else {
            self.add_favorite(coin);
            true
        }
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Register a callback invoked with the new snapshot after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PreferenceState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Stop delivering changes to this subscription.
    /// Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn persist_favorites(&mut self) {
        let json = match serde_json::to_string(&self.state.favorites) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize favorites");
                return;
            }
        };
        if let Err(e) = self.storage.set(FAVORITES_KEY, &json) {
            tracing::warn!(error = %e, "failed to persist favorites");
        }
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}

/// Parse the persisted favorites array. Malformed input yields an empty
/// list; duplicate ids keep their first occurrence.
fn parse_favorites(raw: &str) -> Vec<FavoriteCoin> {
    let parsed: Vec<FavoriteCoin> = match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, "persisted favorites are malformed, starting empty");
            return Vec::new();
        }
    };

    let mut seen = std::collections::HashSet::new();
    parsed
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect()
}
