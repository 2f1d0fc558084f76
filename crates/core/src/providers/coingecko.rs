use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::chart::{ChartTimeframe, PricePoint};
use crate::models::coin::{CoinDetail, CoinMarket};
use crate::models::settings::Settings;

const PROVIDER: &str = "CoinGecko";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko v3 market data provider.
///
/// - **Free**: works without a key; a demo key raises the rate limit.
/// - **Endpoints**: `/coins/markets`, `/coins/{id}`, `/coins/{id}/market_chart`
/// - **Rate limiting**: HTTP 429 is logged and returned as
///   [`CoreError::RateLimited`]. There is no retry; the next poll tick or
///   navigation is the retry.
///
/// CoinGecko ids are lowercase slugs like "bitcoin" or "usd-coin".
/// Currency codes are sent lowercased (`vs_currency=usd`).
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    /// Provider against the public endpoint with default settings.
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.base_url().to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Send the request and decode a JSON body, mapping HTTP failures.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, CoreError> {
        let resp = request.send().await.map_err(|e| {
            tracing::warn!(provider = PROVIDER, error = %e, "request for {what} failed");
            CoreError::from(e)
        })?;
        let resp = check_status(resp, what)?;
        resp.json::<T>().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse {what}: {e}"),
        })
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(resp: Response, what: &str) -> Result<Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(provider = PROVIDER, "rate limit exceeded while fetching {what}");
        return Err(CoreError::RateLimited {
            provider: PROVIDER.into(),
        });
    }
    tracing::warn!(provider = PROVIDER, status = status.as_u16(), "error fetching {what}");
    Err(CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("HTTP {status} while fetching {what}"),
    })
}

fn validate_id(id: &str) -> Result<&str, CoreError> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        return Err(CoreError::ValidationError(format!("Invalid coin id: {id:?}")));
    }
    Ok(id)
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, Option<f64>)>,
}

impl MarketChartResponse {
    fn into_points(self) -> Vec<PricePoint> {
        let mut points: Vec<PricePoint> = self
            .prices
            .into_iter()
            .filter_map(|(ms, price)| {
                let price = price.filter(|p| p.is_finite())?;
                let timestamp = chrono::DateTime::from_timestamp_millis(ms as i64)?;
                Some(PricePoint { timestamp, price })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);
        points
    }
}

/// Decode a `/coins/markets` body.
pub fn parse_top_coins(body: &str) -> Result<Vec<CoinMarket>, CoreError> {
    Ok(serde_json::from_str(body)?)
}

/// Decode a `/coins/{id}` body.
pub fn parse_coin_detail(body: &str) -> Result<CoinDetail, CoreError> {
    Ok(serde_json::from_str(body)?)
}

/// Decode a `/coins/{id}/market_chart` body into price points, oldest first.
/// Samples with a null price are skipped.
pub fn parse_market_chart(body: &str) -> Result<Vec<PricePoint>, CoreError> {
    let resp: MarketChartResponse = serde_json::from_str(body)?;
    Ok(resp.into_points())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_top_coins(
        &self,
        currency: &str,
        per_page: u32,
    ) -> Result<Vec<CoinMarket>, CoreError> {
        let vs = currency.to_lowercase();
        let per_page = per_page.to_string();
        let request = self.get("/coins/markets").query(&[
            ("vs_currency", vs.as_str()),
            ("order", "market_cap_desc"),
            ("per_page", per_page.as_str()),
            ("page", "1"),
        ]);
        let coins: Vec<CoinMarket> = self.fetch_json(request, "top coins").await?;
        tracing::debug!(count = coins.len(), currency = %vs, "fetched top coins");
        Ok(coins)
    }

    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, CoreError> {
        let id = validate_id(id)?;
        let request = self.get(&format!("/coins/{id}")).query(&[
            ("localization", "false"),
            ("tickers", "false"),
            ("community_data", "false"),
            ("developer_data", "false"),
        ]);
        self.fetch_json(request, &format!("details for {id}")).await
    }

    async fn get_market_chart(
        &self,
        id: &str,
        currency: &str,
        timeframe: ChartTimeframe,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let id = validate_id(id)?;
        let vs = currency.to_lowercase();
        let days = timeframe.days().to_string();
        let request = self
            .get(&format!("/coins/{id}/market_chart"))
            .query(&[("vs_currency", vs.as_str()), ("days", days.as_str())]);
        let resp: MarketChartResponse = self
            .fetch_json(request, &format!("market chart for {id}"))
            .await?;
        Ok(resp.into_points())
    }
}
