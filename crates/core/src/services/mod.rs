pub mod chart_service;
pub mod format_service;
pub mod listing_service;
pub mod market_service;
pub mod preference_store;

#[cfg(not(target_arch = "wasm32"))]
pub mod poller;
