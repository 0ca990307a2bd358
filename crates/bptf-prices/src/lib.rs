//! backpack.tf economy Web API client
//!
//! Four read-only endpoints, each wrapped by a method on [`PricesClient`]:
//! - `get_currencies`: internal currency data for Team Fortress 2
//! - `get_price_history`: price history for one item
//! - `get_prices`: the full price schema (cached upstream for 900 seconds)
//! - `get_special_items`: internal item placeholders for an appid
//!
//! Every method validates its parameters synchronously and then either
//! returns a deferred future or, when the parameters carry a callback,
//! spawns the request and hands the result to that callback.
//!
//! # Official Documentation
//! - Web API: https://backpack.tf/api/index.html

pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod types;

pub use client::{Delivery, PricesClient, Reply, ResponseCallback, ResponseFuture};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use params::{
    Craftable, CurrenciesParams, PriceHistoryParams, PricesParams, Quality, QueryParams, Raw,
    SpecialItemsParams, Tradable,
};
pub use types::*;

/// backpack.tf base URL
pub const BPTF_API_BASE: &str = "https://backpack.tf";

/// Only Team Fortress 2 is served by the economy endpoints
pub const TF2_APPID: u32 = 440;

/// Endpoint paths, relative to [`BPTF_API_BASE`]
pub mod endpoints {
    pub const CURRENCIES: &str = "/api/IGetCurrencies/v1";
    pub const PRICE_HISTORY: &str = "/api/IGetPriceHistory/v1";
    pub const PRICES: &str = "/api/IGetPrices/v4";
    pub const SPECIAL_ITEMS: &str = "/api/IGetSpecialItems/v1";
}
