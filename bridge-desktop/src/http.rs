//! `HttpClient` backed by reqwest.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("quran-companion-core/", env!("CARGO_PKG_VERSION"));

/// Desktop HTTP client.
///
/// Connections are pooled by reqwest. Retries are off unless a
/// [`RetryPolicy`] is set with [`ReqwestHttpClient::with_retry`].
pub struct ReqwestHttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client))
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    async fn send_once(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, reqwest::Error> {
        let mut builder = self.client.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(url: &str, e: &reqwest::Error) -> BridgeError {
    if e.is_timeout() {
        BridgeError::Transport(format!("Request to {} timed out", url))
    } else if e.is_connect() {
        BridgeError::Transport(format!("Connection to {} failed: {}", url, e))
    } else {
        BridgeError::Transport(e.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(attempt, attempts, url = %request.url, "GET");
            let last = attempt >= attempts;

            match self.send_once(&request).await {
                // The final attempt hands back whatever status arrived.
                Ok(response) if last || !response.is_retryable() => return Ok(response),
                Ok(response) => {
                    warn!(status = response.status, attempt, url = %request.url, "Retryable status");
                }
                Err(e) if last => return Err(transport_error(&request.url, &e)),
                Err(e) => {
                    warn!(error = %e, attempt, url = %request.url, "Request failed");
                }
            }

            sleep(self.retry.delay_before(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults_to_single_attempt() {
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        assert_eq!(client.retry, RetryPolicy::none());

        let client = client.with_retry(RetryPolicy::with_backoff(3));
        assert_eq!(client.retry.max_attempts, 3);
    }

    #[test]
    fn test_user_agent_names_the_core() {
        assert!(USER_AGENT.starts_with("quran-companion-core/"));
    }
}
