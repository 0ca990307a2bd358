//! Typed views over unwrapped backpack.tf responses
//!
//! The client always returns the raw `response` object as `serde_json::Value`.
//! These types are an opt-in way to read it:
//!
//! ```no_run
//! # async fn demo(client: bptf_prices::PricesClient) -> bptf_prices::Result<()> {
//! use bptf_prices::{parse_response, SpecialItemsParams, SpecialItemsResponse};
//!
//! let reply = client.get_special_items(SpecialItemsParams::new())?;
//! let body = reply.into_deferred().expect("no callback given").await?;
//! let items: SpecialItemsResponse = parse_response(body)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//! 1. Everything except the identifying fields is optional
//! 2. Unrecognized fields are kept in `extra`
//! 3. Shapes the service is known to vary (currency listing, price entries)
//!    accept every observed form

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Deserialize an unwrapped response into one of the typed views
pub fn parse_response<T: DeserializeOwned>(body: Value) -> Result<T> {
    Ok(serde_json::from_value(body)?)
}

// ============================================================================
// Shared
// ============================================================================

/// The service's `message` when an unwrapped body reports `success: 0`
///
/// The client never acts on this; callers that want to treat a refused
/// request as an error can check it themselves.
pub fn rejection_message(body: &Value) -> Option<&str> {
    let refused = match body.get("success")? {
        Value::Number(n) => n.as_i64() == Some(0),
        Value::Bool(ok) => !ok,
        _ => false,
    };
    if !refused {
        return None;
    }
    Some(body.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
}

/// A price as reported by backpack.tf
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_high: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_raw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Price {
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_update.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

// ============================================================================
// IGetCurrencies
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrenciesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<i64>,
    pub currencies: CurrencyListing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Currencies keyed by internal name (`metal`, `keys`, ...), or a plain list
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrencyListing {
    Keyed(BTreeMap<String, Currency>),
    List(Vec<Currency>),
}

impl CurrencyListing {
    pub fn len(&self) -> usize {
        match self {
            CurrencyListing::Keyed(map) => map.len(),
            CurrencyListing::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up by internal key, falling back to the display name
    pub fn get(&self, name: &str) -> Option<&Currency> {
        match self {
            CurrencyListing::Keyed(map) => {
                map.get(name).or_else(|| map.values().find(|c| c.name == name))
            }
            CurrencyListing::List(list) => list.iter().find(|c| c.name == name),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Currency> + '_> {
        match self {
            CurrencyListing::Keyed(map) => Box::new(map.values()),
            CurrencyListing::List(list) => Box::new(list.iter()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Currency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<i64>,
    /// Sent as a string by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priceindex: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craftable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defindex: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// IGetPriceHistory
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<i64>,
    #[serde(default)]
    pub history: Vec<PricePoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of an item's price history, oldest first
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricePoint {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_high: Option<f64>,
    pub currency: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PricePoint {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

// ============================================================================
// IGetPrices
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_usd_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_currency: Option<String>,
    #[serde(default)]
    pub items: BTreeMap<String, PricedItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// quality id -> tradable state -> craftable state -> entries
pub type PriceBreakdown = BTreeMap<String, BTreeMap<String, BTreeMap<String, PriceEntries>>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricedItem {
    #[serde(default)]
    pub defindex: Vec<i64>,
    #[serde(default)]
    pub prices: PriceBreakdown,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PricedItem {
    /// Entries for one quality id / tradable / craftable combination
    pub fn lookup(&self, quality: &str, tradable: &str, craftable: &str) -> Option<&PriceEntries> {
        self.prices.get(quality)?.get(tradable)?.get(craftable)
    }
}

/// Entries without a priceindex come as a list; indexed ones as a map
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceEntries {
    Indexed(BTreeMap<String, Price>),
    List(Vec<Price>),
}

impl PriceEntries {
    pub fn get(&self, priceindex: &str) -> Option<&Price> {
        match self {
            PriceEntries::Indexed(map) => map.get(priceindex),
            PriceEntries::List(list) if priceindex == "0" => list.first(),
            PriceEntries::List(_) => None,
        }
    }
}

// ============================================================================
// IGetSpecialItems
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpecialItemsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<i64>,
    #[serde(default)]
    pub items: Vec<SpecialItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Internal backpack.tf placeholder item
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpecialItem {
    pub defindex: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_quality: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejection_message() {
        let refused = json!({"success": 0, "message": "This API key does not exist."});
        assert_eq!(rejection_message(&refused), Some("This API key does not exist."));
        assert_eq!(rejection_message(&json!({"success": false})), Some("unknown error"));
        assert_eq!(rejection_message(&json!({"success": 1, "items": []})), None);
        assert_eq!(rejection_message(&json!({"items": []})), None);
    }

    #[test]
    fn test_currencies_keyed() {
        let body = json!({
            "success": 1,
            "currencies": {
                "metal": {"name": "Refined Metal", "quality": 6, "priceindex": "0", "defindex": 5002,
                          "price": {"value": 0.07, "currency": "usd", "last_update": 1611752400}},
                "keys": {"name": "Mann Co. Supply Crate Key", "defindex": 5021},
                "earbuds": {"name": "Earbuds", "defindex": 143}
            },
            "name": "Team Fortress 2"
        });
        let parsed: CurrenciesResponse = parse_response(body).unwrap();
        assert_eq!(parsed.currencies.len(), 3);
        let metal = parsed.currencies.get("metal").unwrap();
        assert_eq!(metal.defindex, Some(5002));
        assert_eq!(parsed.currencies.get("Earbuds").unwrap().defindex, Some(143));
        let updated = metal.price.as_ref().unwrap().last_updated_at().unwrap();
        assert_eq!(updated.timestamp(), 1611752400);
    }

    #[test]
    fn test_currencies_list() {
        let body = json!({"currencies": [{"name": "Refined Metal"}, {"name": "Key"}]});
        let parsed: CurrenciesResponse = parse_response(body).unwrap();
        assert!(matches!(parsed.currencies, CurrencyListing::List(_)));
        assert_eq!(parsed.currencies.iter().count(), 2);
        assert!(parsed.currencies.get("Key").is_some());
    }

    #[test]
    fn test_price_history() {
        let body = json!({
            "success": 1,
            "history": [
                {"value": 1.33, "value_high": 1.44, "currency": "metal", "timestamp": 1300000000},
                {"value": 2.0, "currency": "metal", "timestamp": 1400000000}
            ]
        });
        let parsed: PriceHistoryResponse = parse_response(body).unwrap();
        assert_eq!(parsed.history.len(), 2);
        assert_eq!(parsed.history[0].value_high, Some(1.44));
        assert_eq!(parsed.history[1].time().unwrap().timestamp(), 1400000000);
    }

    #[test]
    fn test_prices_breakdown() {
        let body = json!({
            "success": 1,
            "current_time": 1700000000,
            "raw_usd_value": 0.07,
            "usd_currency": "metal",
            "items": {
                "Team Captain": {
                    "defindex": [378],
                    "prices": {
                        "6": {"Tradable": {"Craftable": [{"value": 2.5, "currency": "keys"}]}},
                        "5": {"Tradable": {"Craftable": {"13": {"value": 90, "currency": "keys"}}}}
                    }
                }
            }
        });
        let parsed: PricesResponse = parse_response(body).unwrap();
        let item = &parsed.items["Team Captain"];
        assert_eq!(item.defindex, vec![378]);

        let unique = item.lookup("6", "Tradable", "Craftable").unwrap();
        assert_eq!(unique.get("0").unwrap().value, 2.5);

        let unusual = item.lookup("5", "Tradable", "Craftable").unwrap();
        assert_eq!(unusual.get("13").unwrap().currency, "keys");
        assert!(item.lookup("6", "Non-Tradable", "Craftable").is_none());
    }

    #[test]
    fn test_special_items_keeps_extra_fields() {
        let body = json!({"items": [{"defindex": 1, "name": "Random Craft Hat", "min_ilevel": 1}]});
        let parsed: SpecialItemsResponse = parse_response(body).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].extra.get("min_ilevel"), Some(&json!(1)));
    }
}
