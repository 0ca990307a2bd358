use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`crate::PricesClient`].
///
/// `InvalidParameter` and `NoRuntime` are returned synchronously from the
/// request methods. Every other variant is delivered asynchronously, through
/// either the deferred future or the callback.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid value for {field}: got {value}, expected {expected}")]
    InvalidParameter { field: &'static str, value: String, expected: &'static str },

    #[error("callback delivery requires a running tokio runtime")]
    NoRuntime,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}: {body}")]
    Status { status: StatusCode, url: String, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body has no top-level `response` object")]
    MissingResponse,

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        Error::InvalidParameter { field, value: value.to_string(), expected }
    }

    /// Name of the offending field, for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidParameter { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// True for failures raised before any network call
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidParameter { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
