//! Key-value cache store.
//!
//! Payloads are stored as `{"data": <payload>, "timestamp": <epoch millis>}`
//! under their cache key. A small LRU of decoded entries sits in front of the
//! durable store so hot keys skip JSON decoding.

use bridge_traits::KeyValueStore;
use chrono::{DateTime, TimeZone, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// A cached payload and the moment it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
}

/// Result of a cache write.
///
/// Writes never fail the operation that triggered them; this only says
/// whether the entry actually reached durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Failed(String),
}

impl CacheWrite {
    pub fn is_stored(&self) -> bool {
        matches!(self, CacheWrite::Stored)
    }
}

/// On-device value format.
#[derive(Serialize, Deserialize)]
struct StoredValue {
    data: Value,
    timestamp: i64,
}

/// Durable JSON cache keyed by string.
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    memory: Option<Mutex<LruCache<String, CacheEntry>>>,
    memory_capacity: usize,
    /// Serializes writers so the timestamp check and the write are atomic.
    write_lock: Mutex<()>,
}

impl CacheStore {
    /// Wrap `backend`, keeping up to `memory_capacity` decoded entries in memory.
    ///
    /// A capacity of 0 disables the in-memory front.
    pub fn new(backend: Arc<dyn KeyValueStore>, memory_capacity: usize) -> Self {
        let memory = NonZeroUsize::new(memory_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            backend,
            memory,
            memory_capacity,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the entry for `key`.
    ///
    /// Storage and decode failures are logged and reported as absent.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.try_get(key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key, error = %err, "Cache read failed, treating as absent");
                None
            }
        }
    }

    /// Read the entry for `key`, surfacing storage and decode failures.
    pub async fn try_get(&self, key: &str) -> Result<Option<CacheEntry>> {
        if let Some(memory) = &self.memory {
            if let Some(entry) = memory.lock().await.get(key) {
                return Ok(Some(entry.clone()));
            }
        }

        let raw = self
            .backend
            .get_item(key)
            .await
            .map_err(|source| CacheError::Storage {
                key: key.to_string(),
                source,
            })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let stored: StoredValue =
            serde_json::from_str(&raw).map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })?;

        let entry = CacheEntry {
            key: key.to_string(),
            payload: stored.data,
            stored_at: from_millis(stored.timestamp),
        };

        self.remember(entry.clone()).await;
        Ok(Some(entry))
    }

    /// Replace the entry for `key`.
    ///
    /// `stored_at` never moves backwards for a key: an older timestamp than
    /// the one already stored is raised to it.
    pub async fn set(&self, key: &str, payload: Value, stored_at: DateTime<Utc>) -> CacheWrite {
        match self.try_set(key, payload, stored_at).await {
            Ok(()) => CacheWrite::Stored,
            Err(err) => {
                warn!(key, error = %err, "Cache write failed");
                CacheWrite::Failed(err.to_string())
            }
        }
    }

    /// Replace the entry for `key`, surfacing failures.
    pub async fn try_set(&self, key: &str, payload: Value, stored_at: DateTime<Utc>) -> Result<()> {
        let _writer = self.write_lock.lock().await;
        let stored_at = self.monotonic(key, stored_at).await;

        let raw = serde_json::to_string(&StoredValue {
            data: payload.clone(),
            timestamp: stored_at.timestamp_millis(),
        })
        .map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;

        if let Err(source) = self.backend.set_item(key, &raw).await {
            // Drop the memory copy so reads reflect what is actually stored.
            self.forget(key).await;
            return Err(CacheError::Storage {
                key: key.to_string(),
                source,
            });
        }

        self.remember(CacheEntry {
            key: key.to_string(),
            payload,
            stored_at,
        })
        .await;

        debug!(key, bytes = raw.len(), "Cached entry");
        Ok(())
    }

    /// Delete the entry for `key`.
    pub async fn remove(&self, key: &str) -> CacheWrite {
        self.forget(key).await;
        match self.backend.remove_item(key).await {
            Ok(()) => CacheWrite::Stored,
            Err(err) => {
                warn!(key, error = %err, "Cache remove failed");
                CacheWrite::Failed(err.to_string())
            }
        }
    }

    /// All keys currently held by the durable store.
    pub async fn keys(&self) -> Vec<String> {
        self.backend.list_keys().await.unwrap_or_else(|err| {
            warn!(error = %err, "Listing cache keys failed");
            Vec::new()
        })
    }

    /// Drop every entry, durable and in memory.
    pub async fn clear(&self) -> CacheWrite {
        if let Some(memory) = &self.memory {
            memory.lock().await.clear();
        }
        match self.backend.clear_all().await {
            Ok(()) => CacheWrite::Stored,
            Err(err) => {
                warn!(error = %err, "Clearing cache failed");
                CacheWrite::Failed(err.to_string())
            }
        }
    }

    /// `stored_at`, raised to the timestamp of the entry already stored.
    ///
    /// Must be called with `write_lock` held.
    async fn monotonic(&self, key: &str, stored_at: DateTime<Utc>) -> DateTime<Utc> {
        match self.try_get(key).await {
            Ok(Some(previous)) if previous.stored_at > stored_at => previous.stored_at,
            Ok(_) => stored_at,
            Err(err) => {
                debug!(key, error = %err, "Previous entry unreadable, keeping new timestamp");
                stored_at
            }
        }
    }

    async fn remember(&self, entry: CacheEntry) {
        if let Some(memory) = &self.memory {
            memory.lock().await.put(entry.key.clone(), entry);
        }
    }

    async fn forget(&self, key: &str) {
        if let Some(memory) = &self.memory {
            memory.lock().await.pop(key);
        }
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &"KeyValueStore { ... }")
            .field("memory_capacity", &self.memory_capacity)
            .finish()
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}
