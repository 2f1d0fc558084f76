use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Public CoinGecko v3 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Runtime configuration for the dashboard core.
///
/// Front ends usually keep this in a small JSON file next to the app and
/// hand the string to [`Settings::from_json`]. Missing fields fall back to
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the market data API, without a trailing slash.
    pub api_base_url: String,

    /// Optional CoinGecko demo API key, sent as `x-cg-demo-api-key`.
    pub api_key: Option<String>,

    /// Number of coins requested for the top-coins listing.
    pub per_page: u32,

    /// Seconds between refreshes of the top-coins listing.
    pub poll_interval_secs: u64,

    /// HTTP request timeout in seconds (ignored on wasm32).
    pub request_timeout_secs: u64,

    /// Display currency used when nothing has been persisted yet.
    pub default_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            per_page: 50,
            poll_interval_secs: 60,
            request_timeout_secs: 30,
            default_currency: "USD".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the client or poller misbehave.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "api_base_url must not be empty".into(),
            ));
        }
        if self.per_page == 0 || self.per_page > 250 {
            return Err(CoreError::ValidationError(format!(
                "per_page must be between 1 and 250, got {}",
                self.per_page
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::ValidationError(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.default_currency.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "default_currency must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
