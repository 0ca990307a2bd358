//! Client configuration
//!
//! The API key is optional. Requests without one are still sent and the
//! upstream decides whether to reject them.

use std::time::Duration;

use crate::BPTF_API_BASE;

/// Default outbound request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`crate::PricesClient`]
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
}

impl ClientConfig {
    /// Config with the given API key and default base URL
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Load configuration from environment variables
    ///
    /// - BPTF_API_KEY (optional)
    /// - BPTF_BASE_URL (optional, defaults to https://backpack.tf)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("BPTF_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Ok(base_url) = std::env::var("BPTF_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        config
    }

    /// Set the API key. An empty string is stored as no key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.is_empty() { None } else { Some(api_key) };
        self
    }

    /// Point the client at another host (tests, proxies)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: BPTF_API_BASE.to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
