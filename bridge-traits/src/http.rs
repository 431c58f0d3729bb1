//! HTTP Client Abstraction
//!
//! Every content host the core talks to is a read-only JSON API, so the
//! request type only models `GET`. Non-2xx statuses come back as ordinary
//! responses; the fetcher decides what a status means.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// A `GET` request against one of the content hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Overrides the client-wide timeout for this request.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// A `GET` that asks for JSON.
    pub fn get_json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Accept".to_string(), "application/json".to_string())]),
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::Malformed(format!("JSON deserialization failed: {}", e))
        })
    }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::Malformed(format!("Invalid UTF-8: {}", e)))
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx and 429, the statuses a retrying client may try again.
    pub fn is_retryable(&self) -> bool {
        self.status >= 500 || self.status == 429
    }
}

/// How often a client retries transport failures and retryable statuses.
///
/// The content layer itself never retries: a failed request is surfaced and
/// the user re-triggers it. The default is therefore a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::with_backoff(1)
    }

    /// Doubling delays from 100ms, capped at 30 seconds.
    pub fn with_backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Async HTTP client supplied by the host.
///
/// Only transport failures (DNS, connect, timeout, TLS) are errors.
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn surah_list(client: &dyn HttpClient) -> Result<String> {
///     let response = client
///         .execute(HttpRequest::get_json("https://equran.id/api/v2/surat"))
///         .await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        }
    }

    #[test]
    fn test_get_json_sets_accept() {
        let request = HttpRequest::get_json("https://equran.id/api/v2/surat")
            .header("User-Agent", "test")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.headers.get("Accept").map(String::as_str), Some("application/json"));
        assert_eq!(request.headers.get("User-Agent").map(String::as_str), Some("test"));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_status_classes() {
        assert!(response(200, "").is_success());
        assert!(!response(404, "").is_success());
        assert!(!response(404, "").is_retryable());
        assert!(response(429, "").is_retryable());
        assert!(response(503, "").is_retryable());
    }

    #[test]
    fn test_response_json() {
        let value: serde_json::Value = response(200, r#"{"data":[1,2,3]}"#).json().unwrap();
        assert_eq!(value["data"][1], 2);
        assert!(response(200, "<html>").json::<serde_json::Value>().is_err());
    }

    #[test]
    fn test_retry_delays() {
        assert_eq!(RetryPolicy::default().max_attempts, 1);
        assert_eq!(RetryPolicy::with_backoff(0).max_attempts, 1);

        let policy = RetryPolicy::with_backoff(10);
        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(3), Duration::from_millis(400));
        assert_eq!(policy.delay_before(20), Duration::from_secs(30));
    }
}
