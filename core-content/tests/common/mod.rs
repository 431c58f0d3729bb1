//! Shared harness for accessor tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::ManualClock;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use core_cache::{CacheStore, Fetcher};
use mockall::mock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
pub struct MemoryKv {
    pub items: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> BridgeResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.items.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.items.lock().unwrap().clear();
        Ok(())
    }
}

pub const TWELVE_HOURS: Duration = Duration::from_secs(12 * 60 * 60);

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
}

pub fn respond(status: u16, body: Value) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    })
}

pub struct Harness {
    pub kv: Arc<MemoryKv>,
    pub store: Arc<CacheStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let kv = Arc::new(MemoryKv::default());
        Self {
            store: Arc::new(CacheStore::new(kv.clone(), 16)),
            kv,
            clock: Arc::new(ManualClock::new(start())),
        }
    }

    pub fn fetcher(&self, http: MockHttpClient) -> Arc<Fetcher> {
        Arc::new(Fetcher::new(
            Arc::new(http),
            self.store.clone(),
            self.clock.clone(),
            TWELVE_HOURS,
        ))
    }
}
