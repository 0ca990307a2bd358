//! Request client for the backpack.tf economy API
//!
//! Base URL: https://backpack.tf
//!
//! # Endpoints (all GET, all read-only)
//! - /api/IGetCurrencies/v1 - currency data
//! - /api/IGetPriceHistory/v1 - price history for one item
//! - /api/IGetPrices/v4 - price schema
//! - /api/IGetSpecialItems/v1 - item placeholders
//!
//! # Delivery
//! Each call is validated first; failures come back as
//! `Err(Error::InvalidParameter)` before anything is sent. A valid call
//! yields a [`Reply`]: either a deferred future the caller awaits, or a
//! spawned task that hands the result to the callback from the parameters.

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::params::{
    CurrenciesParams, PriceHistoryParams, PricesParams, QueryParams, SpecialItemsParams,
};

/// Sent as `key` when no API key is configured
pub const NO_KEY: &str = "null";

/// Deferred response: resolves to the unwrapped `response` object
pub type ResponseFuture = BoxFuture<'static, Result<Value>>;

/// Callback invoked once with the outcome of a request
pub struct ResponseCallback(Box<dyn FnOnce(Result<Value>) + Send + 'static>);

impl ResponseCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn call(self, result: Result<Value>) {
        (self.0)(result)
    }
}

impl std::fmt::Debug for ResponseCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResponseCallback")
    }
}

/// How the outcome of one call reaches the caller
#[derive(Debug)]
pub enum Delivery {
    /// Returned as a future
    Deferred,
    /// Handed to a callback from a spawned task
    Callback(ResponseCallback),
}

impl Delivery {
    /// Callback delivery iff a callback was supplied
    pub fn select(callback: Option<ResponseCallback>) -> Self {
        match callback {
            Some(cb) => Delivery::Callback(cb),
            None => Delivery::Deferred,
        }
    }

    /// Route the request future according to this mode
    pub fn deliver(self, request: ResponseFuture) -> Result<Reply> {
        match self {
            Delivery::Deferred => Ok(Reply::Deferred(request)),
            Delivery::Callback(cb) => {
                let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
                let task = handle.spawn(async move { cb.call(request.await) });
                Ok(Reply::Dispatched(task))
            }
        }
    }
}

/// Outcome of a successfully validated call
pub enum Reply {
    /// Await this for the response
    Deferred(ResponseFuture),
    /// The request is in flight and the callback will receive the result.
    /// The handle only signals completion.
    Dispatched(JoinHandle<()>),
}

impl Reply {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Reply::Deferred(_))
    }

    pub fn into_deferred(self) -> Option<ResponseFuture> {
        match self {
            Reply::Deferred(fut) => Some(fut),
            Reply::Dispatched(_) => None,
        }
    }

    pub fn into_handle(self) -> Option<JoinHandle<()>> {
        match self {
            Reply::Dispatched(handle) => Some(handle),
            Reply::Deferred(_) => None,
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Deferred(_) => f.write_str("Reply::Deferred"),
            Reply::Dispatched(_) => f.write_str("Reply::Dispatched"),
        }
    }
}

/// Client for the backpack.tf economy endpoints
#[derive(Clone)]
pub struct PricesClient {
    client: Client,
    config: ClientConfig,
}

impl PricesClient {
    /// Create a client from a config
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a client against the default host with the given key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(api_key))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Currency data for Team Fortress 2
    ///
    /// Endpoint: GET /api/IGetCurrencies/v1?raw={raw}
    pub fn get_currencies(&self, params: CurrenciesParams) -> Result<Reply> {
        self.request(params)
    }

    /// Price history for an item; defaults to a Unique, Tradable, Craftable Team Captain
    ///
    /// Endpoint: GET /api/IGetPriceHistory/v1?appid&item&quality&tradable&craftable&priceindex
    pub fn get_price_history(&self, params: PriceHistoryParams) -> Result<Reply> {
        self.request(params)
    }

    /// Price schema. The upstream caches this globally for 900 seconds.
    ///
    /// Endpoint: GET /api/IGetPrices/v4?raw={raw}&since={since}
    pub fn get_prices(&self, params: PricesParams) -> Result<Reply> {
        self.request(params)
    }

    /// Internal item placeholders for an appid
    ///
    /// Endpoint: GET /api/IGetSpecialItems/v1?appid={appid}
    pub fn get_special_items(&self, params: SpecialItemsParams) -> Result<Reply> {
        self.request(params)
    }

    /// Validate `params`, then send one GET to its endpoint
    pub fn request<P: QueryParams>(&self, mut params: P) -> Result<Reply> {
        let delivery = Delivery::select(params.take_callback());
        let pairs = params.query_pairs()?;
        let url = self.build_url(P::PATH, &pairs)?;
        let request = fetch(self.client.clone(), url).boxed();
        delivery.deliver(request)
    }

    /// Full request URL; the API key is always the last pair, `null` when unset
    pub fn build_url(&self, path: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
            query.append_pair("key", self.config.api_key.as_deref().unwrap_or(NO_KEY));
        }
        Ok(url)
    }
}

async fn fetch(client: Client, url: Url) -> Result<Value> {
    let shown = redacted(&url);
    debug!("GET {}", shown);

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("HTTP {} for {}", status, shown);
        return Err(Error::Status { status, url: shown, body });
    }

    let bytes = response.bytes().await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    unwrap_response(body)
}

/// Extract the inner `response` object from an upstream body, unmodified
pub fn unwrap_response(body: Value) -> Result<Value> {
    let Value::Object(mut envelope) = body else {
        return Err(Error::MissingResponse);
    };

    match envelope.remove("response") {
        Some(inner @ Value::Object(_)) => Ok(inner),
        _ => Err(Error::MissingResponse),
    }
}

/// URL for logs and errors, with the key masked
fn redacted(url: &Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" { "REDACTED".to_string() } else { value.into_owned() };
            (name.into_owned(), value)
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(key: Option<&str>) -> PricesClient {
        let mut config = ClientConfig::default();
        if let Some(key) = key {
            config = config.with_api_key(key);
        }
        PricesClient::new(config).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = PricesClient::with_api_key("abc");
        assert!(client.is_ok());
        assert!(client.unwrap().config().has_api_key());
    }

    #[test]
    fn test_key_is_last_pair() {
        let url = client(Some("abc123"))
            .build_url("/api/IGetPrices/v4", &[("raw", "1".into()), ("since", "5".into())])
            .unwrap();
        assert_eq!(url.as_str(), "https://backpack.tf/api/IGetPrices/v4?raw=1&since=5&key=abc123");
    }

    #[test]
    fn test_missing_key_is_sent_as_null() {
        let url = client(None).build_url("/api/IGetSpecialItems/v1", &[("appid", "440".into())]).unwrap();
        assert_eq!(url.query(), Some("appid=440&key=null"));
    }

    #[test]
    fn test_item_names_are_encoded() {
        let url = client(Some("k"))
            .build_url("/api/IGetPriceHistory/v1", &[("item", "Mann Co. Supply Crate Key".into())])
            .unwrap();
        assert_eq!(url.query(), Some("item=Mann+Co.+Supply+Crate+Key&key=k"));

        let url = client(None).build_url("/x", &[("item", "Bill's Hat & Co".into())]).unwrap();
        let decoded: Vec<_> = url.query_pairs().collect();
        assert_eq!(decoded[0].1, "Bill's Hat & Co");
    }

    #[test]
    fn test_redacted_masks_key() {
        let url = client(Some("secretkey")).build_url("/x", &[("raw", "2".into())]).unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("secretkey"));
        assert!(shown.ends_with("raw=2&key=REDACTED"));
    }

    #[test]
    fn test_unwrap_response() {
        let inner = unwrap_response(json!({"response": {"success": 1, "currencies": {}}})).unwrap();
        assert_eq!(inner, json!({"success": 1, "currencies": {}}));

        assert!(matches!(unwrap_response(json!({"items": []})), Err(Error::MissingResponse)));
        assert!(matches!(unwrap_response(json!([1, 2])), Err(Error::MissingResponse)));
    }

    #[test]
    fn test_unwrap_response_keeps_unsuccessful_body() {
        let body = json!({"success": 0, "message": "API key does not exist."});
        let inner = unwrap_response(json!({"response": body.clone()})).unwrap();
        assert_eq!(inner, body);
    }

    #[test]
    fn test_deferred_without_callback() {
        let reply = client(None).get_currencies(CurrenciesParams::new().raw(2)).unwrap();
        assert!(reply.is_deferred());
    }

    #[test]
    fn test_callback_outside_runtime() {
        let result = client(None).get_currencies(CurrenciesParams::new().raw(2).callback(|_| {}));
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[test]
    fn test_validation_precedes_runtime_check() {
        let result = client(None).get_prices(PricesParams::new().raw(3).callback(|_| {}));
        assert_eq!(result.unwrap_err().field(), Some("raw"));
    }

    #[test]
    fn test_callback_receives_transport_error() {
        // Reserve a port, then close it so the connection is refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = PricesClient::new(ClientConfig::default().with_base_url(&base_url)).unwrap();
        let result = tokio_test::block_on(async move {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let reply = client
                .get_special_items(SpecialItemsParams::new().callback(move |r| {
                    let _ = tx.send(r);
                }))
                .unwrap();
            assert!(!reply.is_deferred());
            rx.await.unwrap()
        });
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
