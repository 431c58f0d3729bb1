//! End-to-end behavior of the service façade with scripted bridges.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::{AudioDevice, AudioHandle, CompletionSender};
use bytes::Bytes;
use core_runtime::events::CacheEvent;
use core_service::{AppConfig, CompanionService, CoreError, CoreEvent};
use mockall::mock;
use serde_json::{json, Value};
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
struct MemoryKv {
    items: Mutex<HashMap<String, String>>,
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

/// Audio device that remembers what it was asked to load.
#[derive(Default)]
struct RecordingDevice {
    loaded: Mutex<Vec<String>>,
    completions: Mutex<Vec<CompletionSender>>,
}

#[async_trait]
impl AudioDevice for RecordingDevice {
    async fn load(&self, uri: &str, completion: CompletionSender) -> BridgeResult<AudioHandle> {
        self.loaded.lock().unwrap().push(uri.to_string());
        self.completions.lock().unwrap().push(completion);
        Ok(AudioHandle::new())
    }

    async fn play(&self, _handle: AudioHandle) -> BridgeResult<()> {
        Ok(())
    }

    async fn pause(&self, _handle: AudioHandle) -> BridgeResult<()> {
        Ok(())
    }

    async fn stop(&self, _handle: AudioHandle) -> BridgeResult<()> {
        Ok(())
    }

    async fn unload(&self, _handle: AudioHandle) -> BridgeResult<()> {
        Ok(())
    }

    async fn position(&self, _handle: AudioHandle) -> BridgeResult<Duration> {
        Ok(Duration::ZERO)
    }
}

fn respond(body: Value) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    })
}

fn verse_audio(verse: u16) -> Value {
    json!({
        "05": format!("https://equran.nos.wjv-1.neo.id/audio-partial/Misyari-Rasyid-Al-Afasi/001{:03}.mp3", verse)
    })
}

fn fatihah_detail() -> Value {
    let ayat: Vec<Value> = (1..=3)
        .map(|n| {
            json!({
                "nomorAyat": n,
                "teksArab": "",
                "teksLatin": "",
                "teksIndonesia": "",
                "audio": verse_audio(n)
            })
        })
        .collect();
    json!({
        "code": 200,
        "data": {
            "nomor": 1,
            "nama": "الفاتحة",
            "namaLatin": "Al-Fatihah",
            "jumlahAyat": 7,
            "tempatTurun": "Mekah",
            "arti": "Pembukaan",
            "deskripsi": "",
            "audioFull": {
                "05": "https://equran.nos.wjv-1.neo.id/audio-full/Misyari-Rasyid-Al-Afasi/001.mp3"
            },
            "ayat": ayat
        }
    })
}

fn surah_list() -> Value {
    json!({
        "code": 200,
        "data": [{
            "nomor": 1,
            "nama": "الفاتحة",
            "namaLatin": "Al-Fatihah",
            "jumlahAyat": 7,
            "tempatTurun": "Mekah",
            "arti": "Pembukaan",
            "deskripsi": "",
            "audioFull": {}
        }]
    })
}

fn service(http: MockHttpClient, device: Option<Arc<RecordingDevice>>) -> CompanionService {
    let mut builder = AppConfig::builder()
        .http_client(Arc::new(http))
        .key_value_store(Arc::new(MemoryKv::default()));
    if let Some(device) = device {
        builder = builder.audio_device(device);
    }
    CompanionService::new(builder.build().unwrap()).unwrap()
}

#[tokio::test]
async fn test_playback_requires_audio_device() {
    let service = service(MockHttpClient::new(), None);

    match service.playback() {
        Err(CoreError::CapabilityMissing { capability, .. }) => {
            assert_eq!(capability, "audio_device")
        }
        other => panic!("expected missing capability, got {:?}", other.map(|_| ())),
    }

    let err = service.play_surah(1, "05").await.unwrap_err();
    assert!(matches!(err, CoreError::CapabilityMissing { .. }));

    // Stopping with nothing configured is a no-op.
    service.stop_playback().await;
}

#[tokio::test]
async fn test_play_verses_queues_from_requested_verse() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .withf(|req| req.url == "https://equran.id/api/v2/surat/1")
        .returning(|_| respond(fatihah_detail()));

    let device = Arc::new(RecordingDevice::default());
    let service = service(http, Some(device.clone()));

    service.play_verses(1, "05", 2).await.unwrap();

    let snapshot = service.playback().unwrap().snapshot().await;
    assert_eq!(snapshot.active_identifier.as_deref(), Some("1:2"));
    assert_eq!(snapshot.queue_len, 2);
    assert_eq!(
        device.loaded.lock().unwrap().as_slice(),
        ["https://equran.nos.wjv-1.neo.id/audio-partial/Misyari-Rasyid-Al-Afasi/001002.mp3"]
    );

    service.stop_playback().await;
    assert!(!service.playback().unwrap().state().await.is_active());
}

#[tokio::test]
async fn test_play_surah_with_unknown_qari_is_content_error() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| respond(fatihah_detail()));

    let device = Arc::new(RecordingDevice::default());
    let service = service(http, Some(device.clone()));

    let err = service.play_surah(1, "03").await.unwrap_err();
    match err {
        CoreError::Content(err) => assert!(err.is_not_found()),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(device.loaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_accessors_share_one_cache() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(2)
        .withf(|req| req.url == "https://equran.id/api/v2/surat")
        .returning(|_| respond(surah_list()));

    let service = service(http, None);
    let mut events = service.events().subscribe();

    let first = service.quran().list_surahs().await.unwrap();
    let clone = service.clone();
    let second = clone.quran().list_surahs().await.unwrap();
    assert_eq!(first, second);

    let mut hit = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Cache(CacheEvent::Hit { key, .. }) = event {
            assert_eq!(key, "surahList");
            hit = true;
        }
    }
    assert!(hit, "second listing should have been a cache hit");

    // Clearing forces the next call back to the network.
    service.clear_cache().await;
    assert!(service.cache().get("surahList").await.is_none());
    service.quran().list_surahs().await.unwrap();
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AppConfig::builder()
        .http_client(Arc::new(MockHttpClient::new()))
        .key_value_store(Arc::new(MemoryKv::default()))
        .hadith_page_size(0)
        .build();

    assert!(config.is_err());
}
