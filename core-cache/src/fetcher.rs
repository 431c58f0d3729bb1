//! Freshness-aware fetcher.
//!
//! Answers from the [`CacheStore`] while an entry is younger than its
//! staleness window. Otherwise it calls the remote location, validates the
//! top-level shape of the response, writes the payload back and returns it.
//! A failed refresh is an error even when an expired entry exists.

use bridge_traits::{Clock, HttpClient, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::store::{CacheEntry, CacheStore, CacheWrite};

/// Which part of the response body is the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// The `data` field of a JSON object; missing or null is a failure.
    #[default]
    DataField,
    /// The whole JSON body.
    WholeBody,
}

/// Where a successful result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

/// A cacheable remote resource.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub location: String,
    pub cache_key: String,
    /// Overrides the fetcher's default staleness window.
    pub max_age: Option<Duration>,
    pub shape: ResponseShape,
}

impl FetchRequest {
    pub fn new(location: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cache_key: cache_key.into(),
            max_age: None,
            shape: ResponseShape::DataField,
        }
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Successful fetch result.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub data: Value,
    pub source: FetchSource,
    /// When the payload was stored (now, for network results).
    pub stored_at: DateTime<Utc>,
    /// Outcome of the write-back; `None` for cache hits.
    pub cache_write: Option<CacheWrite>,
}

impl FetchOutcome {
    pub fn is_from_cache(&self) -> bool {
        self.source == FetchSource::Cache
    }

    /// Deserialize the payload, treating a mismatch as a shape failure.
    pub fn decode<T: DeserializeOwned>(&self, location: &str) -> Result<T, FetchError> {
        serde_json::from_value(self.data.clone()).map_err(|e| FetchError::Shape {
            url: location.to_string(),
            reason: format!("payload does not match the expected model: {}", e),
        })
    }
}

/// Cache-first fetcher over the HTTP and key-value bridges.
pub struct Fetcher {
    http: Arc<dyn HttpClient>,
    store: Arc<CacheStore>,
    clock: Arc<dyn Clock>,
    default_max_age: Duration,
    events: Option<EventBus>,
}

impl Fetcher {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<CacheStore>,
        clock: Arc<dyn Clock>,
        default_max_age: Duration,
    ) -> Self {
        Self {
            http,
            store,
            clock,
            default_max_age,
            events: None,
        }
    }

    /// Publish cache hits, refreshes and failures on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    /// Cache-first fetch.
    #[instrument(skip(self, request), fields(key = %request.cache_key))]
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, FetchError> {
        if let Some(entry) = self.cached(&request.cache_key, request.max_age).await {
            return Ok(FetchOutcome {
                data: entry.payload,
                source: FetchSource::Cache,
                stored_at: entry.stored_at,
                cache_write: None,
            });
        }

        self.refresh(request).await
    }

    /// The entry for `key` if it is younger than `max_age` (default window when `None`).
    ///
    /// Used directly for derived entries that have no remote location of their own.
    pub async fn cached(&self, key: &str, max_age: Option<Duration>) -> Option<CacheEntry> {
        let max_age = max_age.unwrap_or(self.default_max_age);
        let now = self.clock.now();
        let entry = self.store.get(key).await?;

        if !is_fresh(&entry, now, max_age) {
            debug!(key, "Cached entry expired");
            return None;
        }

        let age_secs = now.signed_duration_since(entry.stored_at).num_seconds();
        debug!(key, age_secs, "Serving cached entry");
        self.emit(CacheEvent::Hit {
            key: key.to_string(),
            age_secs,
        });
        Some(entry)
    }

    /// Skip the cache read and go straight to the network (pull-to-refresh).
    #[instrument(skip(self, request), fields(key = %request.cache_key))]
    pub async fn fetch_fresh(&self, request: FetchRequest) -> Result<FetchOutcome, FetchError> {
        self.refresh(request).await
    }

    /// The cached entry for `key` regardless of its age.
    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.store.get(key).await
    }

    /// Network fetch with no cache involvement (hosts whose data is never cached).
    #[instrument(skip(self))]
    pub async fn fetch_uncached(
        &self,
        location: &str,
        shape: ResponseShape,
    ) -> Result<Value, FetchError> {
        self.request(location, shape).await
    }

    async fn refresh(&self, request: FetchRequest) -> Result<FetchOutcome, FetchError> {
        let data = match self.request(&request.location, request.shape).await {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "Fetch failed, no cached fallback");
                self.emit(CacheEvent::FetchFailed {
                    key: request.cache_key.clone(),
                    reason: err.reason(),
                });
                return Err(err);
            }
        };

        let stored_at = self.clock.now();
        let cache_write = self
            .store
            .set(&request.cache_key, data.clone(), stored_at)
            .await;

        match &cache_write {
            CacheWrite::Stored => {
                info!("Refreshed cache entry");
                self.emit(CacheEvent::Refreshed {
                    key: request.cache_key.clone(),
                });
            }
            CacheWrite::Failed(reason) => {
                self.emit(CacheEvent::WriteFailed {
                    key: request.cache_key.clone(),
                    reason: reason.clone(),
                });
            }
        }

        Ok(FetchOutcome {
            data,
            source: FetchSource::Network,
            stored_at,
            cache_write: Some(cache_write),
        })
    }

    async fn request(&self, location: &str, shape: ResponseShape) -> Result<Value, FetchError> {
        let response = self
            .http
            .execute(HttpRequest::get_json(location))
            .await
            .map_err(|e| FetchError::Network {
                url: location.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(FetchError::Status {
                url: location.to_string(),
                status: response.status,
                message: error_message(&response),
            });
        }

        let body: Value = response.json().map_err(|e| FetchError::Shape {
            url: location.to_string(),
            reason: e.to_string(),
        })?;

        extract(body, shape).map_err(|reason| FetchError::Shape {
            url: location.to_string(),
            reason,
        })
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("store", &self.store)
            .field("default_max_age", &self.default_max_age)
            .field("events", &self.events.is_some())
            .finish()
    }
}

/// `now - stored_at < max_age`. An entry stamped in the future counts as fresh.
fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>, max_age: Duration) -> bool {
    match now.signed_duration_since(entry.stored_at).to_std() {
        Ok(age) => age < max_age,
        Err(_) => true,
    }
}

fn extract(body: Value, shape: ResponseShape) -> Result<Value, String> {
    match shape {
        ResponseShape::WholeBody => Ok(body),
        ResponseShape::DataField => match body {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Null) | None => Err("response has no data field".to_string()),
                Some(data) => Ok(data),
            },
            _ => Err("response is not a JSON object".to_string()),
        },
    }
}

fn error_message(response: &HttpResponse) -> Option<String> {
    let body: Value = response.json().ok()?;
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn entry_at(stored_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            key: "k".to_string(),
            payload: json!(null),
            stored_at,
        }
    }

    #[test]
    fn test_freshness_window_is_strict() {
        let stored = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let window = Duration::from_secs(12 * 3600);

        assert!(is_fresh(&entry_at(stored), stored + chrono::Duration::hours(1), window));
        assert!(!is_fresh(&entry_at(stored), stored + chrono::Duration::hours(12), window));
        assert!(!is_fresh(&entry_at(stored), stored + chrono::Duration::hours(13), window));
        assert!(is_fresh(&entry_at(stored), stored - chrono::Duration::minutes(5), window));
    }

    #[test]
    fn test_extract_data_field() {
        assert_eq!(
            extract(json!({"code": 200, "data": [1]}), ResponseShape::DataField),
            Ok(json!([1]))
        );
        assert!(extract(json!({"code": 200}), ResponseShape::DataField).is_err());
        assert!(extract(json!({"data": null}), ResponseShape::DataField).is_err());
        assert!(extract(json!([1, 2]), ResponseShape::DataField).is_err());
        assert_eq!(
            extract(json!([1, 2]), ResponseShape::WholeBody),
            Ok(json!([1, 2]))
        );
    }

    #[test]
    fn test_request_builder() {
        let request = FetchRequest::new("https://equran.id/api/v2/surat", "surahList")
            .max_age(Duration::from_secs(60))
            .shape(ResponseShape::WholeBody);

        assert_eq!(request.cache_key, "surahList");
        assert_eq!(request.max_age, Some(Duration::from_secs(60)));
        assert_eq!(request.shape, ResponseShape::WholeBody);
    }
}
