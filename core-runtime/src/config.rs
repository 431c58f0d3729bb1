//! # Core Configuration Module
//!
//! Provides configuration management for the companion core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an `AppConfig`
//! instance that holds the bridges and settings the core needs. It fails fast
//! when a required bridge is missing so hosts get an actionable message at
//! startup instead of a failure on first use.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Requests against the content APIs
//! - `KeyValueStore` - Durable storage behind the local cache
//!
//! When the `desktop-shims` feature is enabled, `ReqwestHttpClient` and
//! `SqliteKeyValueStore` are injected automatically if not provided (the
//! latter needs a `database_path`).
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Defaults to the system clock
//! - `AudioDevice` - Needed only for recitation playback
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//! use std::time::Duration;
//!
//! let config = AppConfig::builder()
//!     .database_path("/path/to/companion.db")
//!     .cache_max_age(Duration::from_secs(6 * 60 * 60))
//!     .hadith_page_size(25)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AudioDevice, Clock, HttpClient, KeyValueStore, SystemClock};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default staleness window for cached resources.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Default number of decoded entries kept in the in-memory cache front.
pub const DEFAULT_MEMORY_CAPACITY: usize = 64;

/// Default number of hadiths per page.
pub const DEFAULT_HADITH_PAGE_SIZE: u32 = 50;

/// Default overall HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_HADITH_PAGE_SIZE: u32 = 500;

/// Base URLs of the remote content providers.
///
/// Every provider is externally owned; the defaults point at the public
/// hosts the companion app has always used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Quran text, audio and tafsir (`surat`, `surat/{n}`, `tafsir/{n}`)
    pub quran: String,
    /// Prayer cities and monthly schedules (`kota/semua`, `jadwal/...`)
    pub prayer: String,
    /// Supplications (list, by id, keyword search, random)
    pub supplication: String,
    /// Hadith books and ranges
    pub hadith: String,
    /// Gregorian to Hijri calendar conversion
    pub calendar: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            quran: "https://equran.id/api/v2".to_string(),
            prayer: "https://api.myquran.com/v2/sholat".to_string(),
            supplication: "https://doa-doa-api-ahmadramadhan.fly.dev/api".to_string(),
            hadith: "https://api.hadith.gading.dev".to_string(),
            calendar: "https://api.aladhan.com/v1".to_string(),
        }
    }
}

impl ApiEndpoints {
    fn entries(&self) -> [(&'static str, &String); 5] {
        [
            ("quran", &self.quran),
            ("prayer", &self.prayer),
            ("supplication", &self.supplication),
            ("hadith", &self.hadith),
            ("calendar", &self.calendar),
        ]
    }

    /// Point every provider at the same host (useful against a mock server).
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            quran: base.clone(),
            prayer: base.clone(),
            supplication: base.clone(),
            hadith: base.clone(),
            calendar: base,
        }
    }

    fn normalized(mut self) -> Self {
        for url in [
            &mut self.quran,
            &mut self.prayer,
            &mut self.supplication,
            &mut self.hadith,
            &mut self.calendar,
        ] {
            while url.ends_with('/') {
                url.pop();
            }
        }
        self
    }

    /// Validates that every endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in self.entries() {
            if url.is_empty() {
                return Err(Error::Config(format!("The {} endpoint cannot be empty", name)));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::Config(format!(
                    "The {} endpoint must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }
}

/// Freshness and memory settings for the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries older than this are refetched
    pub max_age: Duration,
    /// Decoded entries kept in memory; 0 disables the memory front
    pub memory_capacity: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_CACHE_MAX_AGE,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

/// Core configuration for the companion core.
///
/// Use [`AppConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct AppConfig {
    /// HTTP client for the content APIs
    pub http_client: Arc<dyn HttpClient>,

    /// Durable key-value storage backing the cache
    pub kv_store: Arc<dyn KeyValueStore>,

    /// Time source for staleness decisions
    pub clock: Arc<dyn Clock>,

    /// Host audio device (optional)
    pub audio_device: Option<Arc<dyn AudioDevice>>,

    /// Remote provider base URLs
    pub endpoints: ApiEndpoints,

    /// Cache freshness settings
    pub cache: CachePolicy,

    /// Hadiths per page for paged lookups
    pub hadith_page_size: u32,

    /// Event bus buffer size
    pub event_buffer_size: usize,

    /// Overall HTTP request timeout
    pub request_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("kv_store", &"KeyValueStore { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "audio_device",
                &self.audio_device.as_ref().map(|_| "AudioDevice { ... }"),
            )
            .field("endpoints", &self.endpoints)
            .field("cache", &self.cache)
            .field("hadith_page_size", &self.hadith_page_size)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Every endpoint is an http(s) URL
    /// - The staleness window is non-zero
    /// - The hadith page size is within 1..=500
    /// - The event buffer and request timeout are non-zero
    pub fn validate(&self) -> Result<()> {
        self.endpoints.validate()?;

        if self.cache.max_age.is_zero() {
            return Err(Error::Config(
                "Cache max age must be greater than zero".to_string(),
            ));
        }

        if self.hadith_page_size == 0 || self.hadith_page_size > MAX_HADITH_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Hadith page size must be between 1 and {}, got {}",
                MAX_HADITH_PAGE_SIZE, self.hadith_page_size
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the content APIs. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack (URLSession/OkHttp)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn kv_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "KeyValueStore implementation is required for the local cache. \
                 Desktop: enable the 'desktop-shims' feature and set .database_path(). \
                 Mobile: inject platform key-value storage (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(timeout)?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_kv_store(database_path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::SqliteKeyValueStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = database_path.ok_or_else(|| Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "No KeyValueStore was provided and no database path is set. \
                 Use .database_path() for the default SqliteKeyValueStore or \
                 .key_value_store() to inject one."
            .to_string(),
    })?;

    let init_store = |path: PathBuf| -> Result<SqliteKeyValueStore> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default key-value store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteKeyValueStore::new(path))
            .map_err(Error::from)
    };

    // block_on panics inside a runtime, so hop to a plain thread first.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default KeyValueStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_kv_store(_database_path: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    Err(kv_store_missing_error())
}

/// Builder for constructing [`AppConfig`] instances.
#[derive(Default)]
pub struct AppConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    kv_store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    audio_device: Option<Arc<dyn AudioDevice>>,
    endpoints: Option<ApiEndpoints>,
    cache_max_age: Option<Duration>,
    memory_capacity: Option<usize>,
    hadith_page_size: Option<u32>,
    event_buffer_size: Option<usize>,
    request_timeout: Option<Duration>,
}

impl AppConfigBuilder {
    /// Sets the SQLite file used by the default desktop key-value store.
    ///
    /// Ignored when a store is injected with [`key_value_store`](Self::key_value_store).
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the durable key-value store.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.kv_store = Some(store);
        self
    }

    /// Sets the time source. Default: system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the host audio device used for recitation playback.
    pub fn audio_device(mut self, device: Arc<dyn AudioDevice>) -> Self {
        self.audio_device = Some(device);
        self
    }

    /// Overrides the provider base URLs. Trailing slashes are trimmed.
    pub fn endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Sets the staleness window. Default: 12 hours.
    pub fn cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = Some(max_age);
        self
    }

    /// Sets how many decoded entries stay in memory. Default: 64; 0 disables.
    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = Some(capacity);
        self
    }

    /// Sets the number of hadiths per page. Default: 50.
    pub fn hadith_page_size(mut self, size: u32) -> Self {
        self.hadith_page_size = Some(size);
        self
    }

    /// Sets the event bus buffer size. Default: 100.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the overall HTTP request timeout. Default: 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the final `AppConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(AppConfig)` on success, or an error if:
    /// - A required bridge is missing and no desktop default applies
    /// - Configuration values are invalid
    pub fn build(self) -> Result<AppConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let kv_store = match self.kv_store {
            Some(store) => store,
            None => provide_default_kv_store(self.database_path)?,
        };

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let config = AppConfig {
            http_client,
            kv_store,
            clock,
            audio_device: self.audio_device,
            endpoints: self.endpoints.unwrap_or_default().normalized(),
            cache: CachePolicy {
                max_age: self.cache_max_age.unwrap_or(DEFAULT_CACHE_MAX_AGE),
                memory_capacity: self.memory_capacity.unwrap_or(DEFAULT_MEMORY_CAPACITY),
            },
            hadith_page_size: self.hadith_page_size.unwrap_or(DEFAULT_HADITH_PAGE_SIZE),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            request_timeout,
        };

        config.validate()?;
        Ok(config)
    }
}
