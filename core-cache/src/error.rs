//! Cache and fetch error types.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Failures of the underlying key-value storage.
///
/// The store never hands these to callers of `get`/`set`; they surface only
/// through the `try_*` variants and log lines.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage failure for '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: BridgeError,
    },

    #[error("Stored value for '{key}' is not a valid cache entry: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Payload for '{key}' could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Why a remote fetch failed.
///
/// Every variant is treated alike by callers: the fetch produced no data and
/// no cached fallback is offered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// DNS, connect, TLS or timeout failure.
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: u16,
        /// `message` field of the error body, when the server sent one.
        message: Option<String>,
    },

    /// The body was not JSON or lacked the expected top-level field.
    #[error("Unexpected response from {url}: {reason}")]
    Shape { url: String, reason: String },
}

impl FetchError {
    /// Human-readable reason, preferring the server's own message.
    pub fn reason(&self) -> String {
        match self {
            FetchError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            FetchError::Network { reason, .. } | FetchError::Shape { reason, .. } => {
                reason.clone()
            }
            other => other.to_string(),
        }
    }

    /// URL of the failed request.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Shape { url, .. } => url,
        }
    }
}
