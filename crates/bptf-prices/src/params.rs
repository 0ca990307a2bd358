//! Parameter bags for the four economy endpoints
//!
//! Every field is optional. Missing or falsy values (`0`, `""`) take the
//! endpoint default; supplied values are checked against their domain before
//! any request is built. Each bag may also carry a callback, which switches
//! the call from deferred to callback delivery.
//!
//! All bags deserialize from a JSON object and ignore unknown fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ResponseCallback;
use crate::error::{Error, Result};
use crate::{endpoints, TF2_APPID};

/// Default item for price history lookups
pub const DEFAULT_ITEM: &str = "Team Captain";

/// Default lower bound for `since` in price schema requests (2021-01-27 13:00 UTC)
pub const DEFAULT_SINCE: i64 = 1_611_752_400;

const RAW_DOMAIN: &str = "1 or 2";
const APPID_DOMAIN: &str = "440";

// ============================================================================
// Enumerated domains
// ============================================================================

/// Shape of the raw value in price index objects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Raw {
    #[default]
    One,
    Two,
}

impl Raw {
    pub fn value(self) -> u8 {
        match self {
            Raw::One => 1,
            Raw::Two => 2,
        }
    }

    fn from_field(raw: Option<i64>) -> Result<Self> {
        match raw {
            None | Some(0) => Ok(Raw::default()),
            Some(1) => Ok(Raw::One),
            Some(2) => Ok(Raw::Two),
            Some(other) => Err(Error::invalid("raw", other, RAW_DOMAIN)),
        }
    }
}

/// Item quality as named by backpack.tf
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Normal,
    Genuine,
    Vintage,
    Unusual,
    #[default]
    Unique,
    Community,
    Valve,
    #[serde(rename = "Self-Made")]
    SelfMade,
    Strange,
    Haunted,
    #[serde(rename = "Collector's")]
    Collectors,
    #[serde(rename = "Decorated Weapon")]
    DecoratedWeapon,
}

impl Quality {
    pub const ALL: [Quality; 12] = [
        Quality::Normal,
        Quality::Genuine,
        Quality::Vintage,
        Quality::Unusual,
        Quality::Unique,
        Quality::Community,
        Quality::Valve,
        Quality::SelfMade,
        Quality::Strange,
        Quality::Haunted,
        Quality::Collectors,
        Quality::DecoratedWeapon,
    ];

    const DOMAIN: &'static str = "one of Normal, Genuine, Vintage, Unusual, Unique, Community, \
                                  Valve, Self-Made, Strange, Haunted, Collector's, Decorated Weapon";

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Normal => "Normal",
            Quality::Genuine => "Genuine",
            Quality::Vintage => "Vintage",
            Quality::Unusual => "Unusual",
            Quality::Unique => "Unique",
            Quality::Community => "Community",
            Quality::Valve => "Valve",
            Quality::SelfMade => "Self-Made",
            Quality::Strange => "Strange",
            Quality::Haunted => "Haunted",
            Quality::Collectors => "Collector's",
            Quality::DecoratedWeapon => "Decorated Weapon",
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| Error::invalid("quality", s, Quality::DOMAIN))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tradable {
    #[default]
    Tradable,
    #[serde(rename = "Non-Tradable")]
    NonTradable,
}

impl Tradable {
    pub fn as_str(self) -> &'static str {
        match self {
            Tradable::Tradable => "Tradable",
            Tradable::NonTradable => "Non-Tradable",
        }
    }
}

impl FromStr for Tradable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Tradable" => Ok(Tradable::Tradable),
            "Non-Tradable" => Ok(Tradable::NonTradable),
            other => Err(Error::invalid("tradable", other, "Tradable or Non-Tradable")),
        }
    }
}

impl fmt::Display for Tradable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Craftable {
    #[default]
    Craftable,
    #[serde(rename = "Non-Craftable")]
    NonCraftable,
}

impl Craftable {
    pub fn as_str(self) -> &'static str {
        match self {
            Craftable::Craftable => "Craftable",
            Craftable::NonCraftable => "Non-Craftable",
        }
    }
}

impl FromStr for Craftable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Craftable" => Ok(Craftable::Craftable),
            "Non-Craftable" => Ok(Craftable::NonCraftable),
            other => Err(Error::invalid("craftable", other, "Craftable or Non-Craftable")),
        }
    }
}

impl fmt::Display for Craftable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Shared field checks
// ============================================================================

fn appid_field(appid: Option<i64>) -> Result<u32> {
    match appid {
        None | Some(0) => Ok(TF2_APPID),
        Some(id) if id == TF2_APPID as i64 => Ok(TF2_APPID),
        Some(other) => Err(Error::invalid("appid", other, APPID_DOMAIN)),
    }
}

/// Falsy strings fall back to the default
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// ============================================================================
// Endpoint contract
// ============================================================================

/// A parameter bag for one endpoint
pub trait QueryParams {
    /// Endpoint path, relative to the API base
    const PATH: &'static str;

    /// Attach a callback, replacing any previous one
    fn set_callback(&mut self, callback: ResponseCallback);

    /// Remove the callback, if any. Called once per request.
    fn take_callback(&mut self) -> Option<ResponseCallback>;

    /// Normalized query pairs in wire order, without the API key
    fn query_pairs(&self) -> Result<Vec<(&'static str, String)>>;
}

// ============================================================================
// IGetCurrencies
// ============================================================================

/// Parameters for `GET /api/IGetCurrencies/v1`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CurrenciesParams {
    pub raw: Option<i64>,
    #[serde(skip)]
    pub callback: Option<ResponseCallback>,
}

/// Validated currencies query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrenciesQuery {
    pub raw: Raw,
}

impl CurrenciesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, raw: i64) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.callback = Some(ResponseCallback::new(f));
        self
    }

    pub fn normalize(&self) -> Result<CurrenciesQuery> {
        Ok(CurrenciesQuery { raw: Raw::from_field(self.raw)? })
    }
}

impl QueryParams for CurrenciesParams {
    const PATH: &'static str = endpoints::CURRENCIES;

    fn set_callback(&mut self, callback: ResponseCallback) {
        self.callback = Some(callback);
    }

    fn take_callback(&mut self) -> Option<ResponseCallback> {
        self.callback.take()
    }

    fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let q = self.normalize()?;
        Ok(vec![("raw", q.raw.value().to_string())])
    }
}

// ============================================================================
// IGetPriceHistory
// ============================================================================

/// Parameters for `GET /api/IGetPriceHistory/v1`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PriceHistoryParams {
    pub appid: Option<i64>,
    pub item: Option<String>,
    pub quality: Option<String>,
    pub tradable: Option<String>,
    pub craftable: Option<String>,
    pub priceindex: Option<i64>,
    #[serde(skip)]
    pub callback: Option<ResponseCallback>,
}

/// Validated price history query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceHistoryQuery {
    pub appid: u32,
    pub item: String,
    pub quality: Quality,
    pub tradable: Tradable,
    pub craftable: Craftable,
    pub priceindex: i64,
}

impl PriceHistoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appid(mut self, appid: i64) -> Self {
        self.appid = Some(appid);
        self
    }

    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn tradable(mut self, tradable: impl Into<String>) -> Self {
        self.tradable = Some(tradable.into());
        self
    }

    pub fn craftable(mut self, craftable: impl Into<String>) -> Self {
        self.craftable = Some(craftable.into());
        self
    }

    pub fn priceindex(mut self, priceindex: i64) -> Self {
        self.priceindex = Some(priceindex);
        self
    }

    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.callback = Some(ResponseCallback::new(f));
        self
    }

    pub fn normalize(&self) -> Result<PriceHistoryQuery> {
        let appid = appid_field(self.appid)?;

        let item = match non_empty(&self.item) {
            None => DEFAULT_ITEM.to_string(),
            Some(item) if item.trim().is_empty() => {
                return Err(Error::invalid("item", item, "a non-empty item name"))
            }
            Some(item) => item.to_string(),
        };

        let quality =
            non_empty(&self.quality).map(str::parse::<Quality>).transpose()?.unwrap_or_default();
        let tradable =
            non_empty(&self.tradable).map(str::parse::<Tradable>).transpose()?.unwrap_or_default();
        let craftable = non_empty(&self.craftable)
            .map(str::parse::<Craftable>)
            .transpose()?
            .unwrap_or_default();

        Ok(PriceHistoryQuery {
            appid,
            item,
            quality,
            tradable,
            craftable,
            priceindex: self.priceindex.unwrap_or(0),
        })
    }
}

impl QueryParams for PriceHistoryParams {
    const PATH: &'static str = endpoints::PRICE_HISTORY;

    fn set_callback(&mut self, callback: ResponseCallback) {
        self.callback = Some(callback);
    }

    fn take_callback(&mut self) -> Option<ResponseCallback> {
        self.callback.take()
    }

    fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let q = self.normalize()?;
        Ok(vec![
            ("appid", q.appid.to_string()),
            ("item", q.item),
            ("quality", q.quality.as_str().to_string()),
            ("tradable", q.tradable.as_str().to_string()),
            ("craftable", q.craftable.as_str().to_string()),
            ("priceindex", q.priceindex.to_string()),
        ])
    }
}

// ============================================================================
// IGetPrices
// ============================================================================

/// Parameters for `GET /api/IGetPrices/v4`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PricesParams {
    pub raw: Option<i64>,
    /// Only return prices with `last_update >= since` (UNIX seconds)
    pub since: Option<i64>,
    #[serde(skip)]
    pub callback: Option<ResponseCallback>,
}

/// Validated price schema query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricesQuery {
    pub raw: Raw,
    pub since: i64,
}

impl PricesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, raw: i64) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn since(mut self, since: i64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.callback = Some(ResponseCallback::new(f));
        self
    }

    pub fn normalize(&self) -> Result<PricesQuery> {
        let raw = Raw::from_field(self.raw)?;
        let since = match self.since {
            None | Some(0) => DEFAULT_SINCE,
            Some(ts) if ts > 0 => ts,
            Some(other) => return Err(Error::invalid("since", other, "a positive UNIX timestamp")),
        };
        Ok(PricesQuery { raw, since })
    }
}

impl QueryParams for PricesParams {
    const PATH: &'static str = endpoints::PRICES;

    fn set_callback(&mut self, callback: ResponseCallback) {
        self.callback = Some(callback);
    }

    fn take_callback(&mut self) -> Option<ResponseCallback> {
        self.callback.take()
    }

    fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let q = self.normalize()?;
        Ok(vec![("raw", q.raw.value().to_string()), ("since", q.since.to_string())])
    }
}

// ============================================================================
// IGetSpecialItems
// ============================================================================

/// Parameters for `GET /api/IGetSpecialItems/v1`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpecialItemsParams {
    pub appid: Option<i64>,
    #[serde(skip)]
    pub callback: Option<ResponseCallback>,
}

/// Validated special items query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecialItemsQuery {
    pub appid: u32,
}

impl SpecialItemsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appid(mut self, appid: i64) -> Self {
        self.appid = Some(appid);
        self
    }

    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.callback = Some(ResponseCallback::new(f));
        self
    }

    pub fn normalize(&self) -> Result<SpecialItemsQuery> {
        Ok(SpecialItemsQuery { appid: appid_field(self.appid)? })
    }
}

impl QueryParams for SpecialItemsParams {
    const PATH: &'static str = endpoints::SPECIAL_ITEMS;

    fn set_callback(&mut self, callback: ResponseCallback) {
        self.callback = Some(callback);
    }

    fn take_callback(&mut self) -> Option<ResponseCallback> {
        self.callback.take()
    }

    fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let q = self.normalize()?;
        Ok(vec![("appid", q.appid.to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies_defaults() {
        let q = CurrenciesParams::new().normalize().unwrap();
        assert_eq!(q.raw, Raw::One);
    }

    #[test]
    fn test_raw_domain() {
        assert_eq!(CurrenciesParams::new().raw(2).normalize().unwrap().raw, Raw::Two);
        // 0 is falsy and falls back to the default
        assert_eq!(CurrenciesParams::new().raw(0).normalize().unwrap().raw, Raw::One);

        let err = PricesParams::new().raw(3).normalize().unwrap_err();
        match err {
            Error::InvalidParameter { field, value, expected } => {
                assert_eq!(field, "raw");
                assert_eq!(value, "3");
                assert_eq!(expected, "1 or 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_price_history_defaults() {
        let q = PriceHistoryParams::new().normalize().unwrap();
        assert_eq!(
            q,
            PriceHistoryQuery {
                appid: 440,
                item: "Team Captain".to_string(),
                quality: Quality::Unique,
                tradable: Tradable::Tradable,
                craftable: Craftable::Craftable,
                priceindex: 0,
            }
        );
    }

    #[test]
    fn test_price_history_item_keeps_default_quality() {
        let q = PriceHistoryParams::new().item("Mann Co. Supply Crate Key").normalize().unwrap();
        assert_eq!(q.item, "Mann Co. Supply Crate Key");
        assert_eq!(q.quality, Quality::Unique);
    }

    #[test]
    fn test_every_quality_is_accepted() {
        for quality in Quality::ALL {
            let q = PriceHistoryParams::new().quality(quality.as_str()).normalize().unwrap();
            assert_eq!(q.quality, quality);
        }
    }

    #[test]
    fn test_enumerated_fields_reject_unknown_values() {
        let cases = [
            (PriceHistoryParams::new().quality("Shiny"), "quality"),
            (PriceHistoryParams::new().quality("unique"), "quality"),
            (PriceHistoryParams::new().tradable("Maybe"), "tradable"),
            (PriceHistoryParams::new().craftable("Uncraftable"), "craftable"),
            (PriceHistoryParams::new().appid(730), "appid"),
            (PriceHistoryParams::new().item("   "), "item"),
        ];
        for (params, field) in cases {
            let err = params.normalize().unwrap_err();
            assert_eq!(err.field(), Some(field), "{err}");
        }
    }

    #[test]
    fn test_blank_item_reports_value_as_given() {
        match PriceHistoryParams::new().item("  ").normalize().unwrap_err() {
            Error::InvalidParameter { field, value, expected } => {
                assert_eq!(field, "item");
                assert_eq!(value, "  ");
                assert_eq!(expected, "a non-empty item name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_tradable_non_craftable() {
        let q = PriceHistoryParams::new()
            .tradable("Non-Tradable")
            .craftable("Non-Craftable")
            .normalize()
            .unwrap();
        assert_eq!(q.tradable, Tradable::NonTradable);
        assert_eq!(q.craftable, Craftable::NonCraftable);
    }

    #[test]
    fn test_price_history_pair_order() {
        let pairs = PriceHistoryParams::new().quality("Strange").priceindex(5).query_pairs().unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["appid", "item", "quality", "tradable", "craftable", "priceindex"]);
        assert_eq!(pairs[2].1, "Strange");
        assert_eq!(pairs[5].1, "5");
    }

    #[test]
    fn test_prices_since() {
        assert_eq!(PricesParams::new().normalize().unwrap().since, DEFAULT_SINCE);
        assert_eq!(PricesParams::new().since(1_700_000_000).normalize().unwrap().since, 1_700_000_000);
        assert_eq!(PricesParams::new().since(-5).normalize().unwrap_err().field(), Some("since"));
    }

    #[test]
    fn test_special_items_appid() {
        assert_eq!(SpecialItemsParams::new().normalize().unwrap().appid, 440);
        assert_eq!(SpecialItemsParams::new().appid(440).normalize().unwrap().appid, 440);
        assert!(SpecialItemsParams::new().appid(570).normalize().is_err());
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let params: PriceHistoryParams = serde_json::from_str(
            r#"{"item": "Ellis' Cap", "quality": "Vintage", "currency": "keys"}"#,
        )
        .unwrap();
        let q = params.normalize().unwrap();
        assert_eq!(q.item, "Ellis' Cap");
        assert_eq!(q.quality, Quality::Vintage);
        assert!(params.callback.is_none());
    }

    #[test]
    fn test_take_callback_removes_it() {
        let mut params = CurrenciesParams::new().raw(2).callback(|_| {});
        assert!(params.take_callback().is_some());
        assert!(params.take_callback().is_none());
        assert_eq!(params.query_pairs().unwrap(), vec![("raw", "2".to_string())]);
    }
}
