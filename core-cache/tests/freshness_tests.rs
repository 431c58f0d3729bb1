//! Cache freshness behavior of the fetcher against mocked bridges.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::ManualClock;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use core_cache::{CacheStore, CacheWrite, FetchError, FetchRequest, FetchSource, Fetcher};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use mockall::mock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
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
struct MemoryKv {
    items: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::StorageError("disk full".to_string()));
        }
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

const SURAT_URL: &str = "https://equran.id/api/v2/surat";
const TWELVE_HOURS: Duration = Duration::from_secs(12 * 60 * 60);

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
}

fn ok_json(body: &'static str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: Bytes::from(body),
    })
}

struct Harness {
    kv: Arc<MemoryKv>,
    store: Arc<CacheStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        let kv = Arc::new(MemoryKv::default());
        // Memory front disabled so every read goes through the durable store.
        let store = Arc::new(CacheStore::new(kv.clone(), 0));
        Self {
            kv,
            store,
            clock: Arc::new(ManualClock::new(start())),
        }
    }

    fn fetcher(&self, http: MockHttpClient) -> Fetcher {
        Fetcher::new(
            Arc::new(http),
            self.store.clone(),
            self.clock.clone(),
            TWELVE_HOURS,
        )
    }

    async fn seed(&self, key: &str, payload: serde_json::Value, stored_at: DateTime<Utc>) {
        assert!(self.store.set(key, payload, stored_at).await.is_stored());
    }
}

#[tokio::test]
async fn test_cache_hit_within_window_skips_network() {
    let harness = Harness::new();
    harness.seed("surahList", json!([{"nomor": 1}]), start()).await;
    harness.clock.advance(ChronoDuration::hours(1));

    let mut http = MockHttpClient::new();
    http.expect_execute().times(0);

    let outcome = harness
        .fetcher(http)
        .fetch(FetchRequest::new(SURAT_URL, "surahList"))
        .await
        .unwrap();

    assert_eq!(outcome.source, FetchSource::Cache);
    assert_eq!(outcome.data, json!([{"nomor": 1}]));
    assert_eq!(outcome.stored_at, start());
    assert!(outcome.cache_write.is_none());
}

#[tokio::test]
async fn test_cache_miss_after_window_refreshes_entry() {
    let harness = Harness::new();
    harness.seed("surahList", json!(["old"]), start()).await;
    harness.clock.advance(ChronoDuration::hours(13));

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .withf(|req| req.url == SURAT_URL)
        .returning(|_| ok_json(r#"{"code":200,"message":"ok","data":["new"]}"#));

    let outcome = harness
        .fetcher(http)
        .fetch(FetchRequest::new(SURAT_URL, "surahList"))
        .await
        .unwrap();

    assert_eq!(outcome.source, FetchSource::Network);
    assert_eq!(outcome.data, json!(["new"]));
    assert_eq!(outcome.cache_write, Some(CacheWrite::Stored));

    let entry = harness.store.get("surahList").await.unwrap();
    assert_eq!(entry.payload, json!(["new"]));
    assert_eq!(entry.stored_at, start() + ChronoDuration::hours(13));
}

#[tokio::test]
async fn test_no_stale_fallback_on_network_error() {
    let harness = Harness::new();
    harness.seed("surahDetail_2", json!({"nomor": 2}), start()).await;
    harness.clock.advance(ChronoDuration::hours(20));

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Transport("Request timed out".to_string())));

    let result = harness
        .fetcher(http)
        .fetch(FetchRequest::new(format!("{}/2", SURAT_URL), "surahDetail_2"))
        .await;

    assert!(matches!(result, Err(FetchError::Network { .. })));

    // The expired entry is still there, untouched.
    let entry = harness.store.get("surahDetail_2").await.unwrap();
    assert_eq!(entry.stored_at, start());
}

#[tokio::test]
async fn test_missing_data_field_is_a_failure() {
    let harness = Harness::new();

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(r#"{"code":200,"message":"ok","data":null}"#));

    let result = harness
        .fetcher(http)
        .fetch(FetchRequest::new(SURAT_URL, "surahList"))
        .await;

    assert!(matches!(result, Err(FetchError::Shape { .. })));
    assert!(harness.store.get("surahList").await.is_none());
}

#[tokio::test]
async fn test_non_success_status_carries_server_message() {
    let harness = Harness::new();

    let mut http = MockHttpClient::new();
    http.expect_execute().times(1).returning(|_| {
        Ok(HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::from(r#"{"code":404,"message":"Surat tidak ditemukan"}"#),
        })
    });

    let err = harness
        .fetcher(http)
        .fetch(FetchRequest::new(format!("{}/999", SURAT_URL), "surahDetail_999"))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), "Surat tidak ditemukan");
}

#[tokio::test]
async fn test_write_failure_does_not_fail_fetch() {
    let harness = Harness::new();
    harness.kv.fail_writes.store(true, Ordering::SeqCst);

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(r#"{"data":[1,2,3]}"#));

    let outcome = harness
        .fetcher(http)
        .fetch(FetchRequest::new(SURAT_URL, "surahList"))
        .await
        .unwrap();

    assert_eq!(outcome.data, json!([1, 2, 3]));
    assert!(matches!(outcome.cache_write, Some(CacheWrite::Failed(_))));
}

#[tokio::test]
async fn test_fetch_fresh_ignores_fresh_entry() {
    let harness = Harness::new();
    harness.seed("prayerCities", json!(["cached"]), start()).await;

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(r#"{"status":true,"data":["fresh"]}"#));

    let fetcher = harness.fetcher(http);
    let outcome = fetcher
        .fetch_fresh(FetchRequest::new("https://api.myquran.com/v2/sholat/kota/semua", "prayerCities"))
        .await
        .unwrap();

    assert_eq!(outcome.data, json!(["fresh"]));
    assert_eq!(fetcher.peek("prayerCities").await.unwrap().payload, json!(["fresh"]));
}

#[tokio::test]
async fn test_per_call_max_age_overrides_default() {
    let harness = Harness::new();
    harness.seed("hijriCalendar_2024_3", json!([]), start()).await;
    harness.clock.advance(ChronoDuration::minutes(10));

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(r#"{"code":200,"data":[{"hijri":{}}]}"#));

    let outcome = harness
        .fetcher(http)
        .fetch(
            FetchRequest::new("https://api.aladhan.com/v1/gToHCalendar/3/2024", "hijriCalendar_2024_3")
                .max_age(Duration::from_secs(5 * 60)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.source, FetchSource::Network);
}

#[tokio::test]
async fn test_events_published_for_hit_and_refresh() {
    let harness = Harness::new();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(r#"{"data":{"nomor":1}}"#));

    let fetcher = harness.fetcher(http).with_event_bus(bus);
    let request = FetchRequest::new(format!("{}/1", SURAT_URL), "surahDetail_1");

    fetcher.fetch(request.clone()).await.unwrap();
    fetcher.fetch(request).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Cache(CacheEvent::Refreshed {
            key: "surahDetail_1".to_string()
        })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Cache(CacheEvent::Hit {
            key: "surahDetail_1".to_string(),
            age_secs: 0
        })
    );
}
