//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, key-value
//! storage, clock, audio device) into the shared core: one cache store, one
//! fetcher, the content accessors and, when an audio device is available, the
//! playback controller. Desktop apps typically enable the `desktop-shims`
//! feature so [`AppConfig::builder`] can fall back to `bridge-desktop`.

pub mod error;
pub mod recitation;
pub mod view;

pub use error::{CoreError, Result};
pub use recitation::{verse_identifier, verse_queue, verse_queue_from};
pub use view::{ViewHandle, ViewScope};

pub use core_runtime::config::{ApiEndpoints, AppConfig, AppConfigBuilder};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};
pub use core_runtime::logging::{init_logging, LoggingConfig};

use core_cache::{CacheStore, CacheWrite, Fetcher};
use core_content::{
    CalendarAccessor, ContentAccessors, HadithAccessor, PrayerAccessor, QuranAccessor, Qari,
    SupplicationAccessor,
};
use core_playback::{PlaybackController, PlaybackItem, PlaybackScope};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CompanionService {
    config: Arc<AppConfig>,
    events: EventBus,
    store: Arc<CacheStore>,
    fetcher: Arc<Fetcher>,
    content: ContentAccessors,
    playback: Option<PlaybackController>,
}

impl CompanionService {
    /// Create a new service from a validated configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let store = Arc::new(CacheStore::new(
            config.kv_store.clone(),
            config.cache.memory_capacity,
        ));
        let fetcher = Arc::new(
            Fetcher::new(
                config.http_client.clone(),
                store.clone(),
                config.clock.clone(),
                config.cache.max_age,
            )
            .with_event_bus(events.clone()),
        );
        let content = ContentAccessors::new(
            fetcher.clone(),
            &config.endpoints,
            config.hadith_page_size,
        );
        let playback = config
            .audio_device
            .clone()
            .map(|device| PlaybackController::with_event_bus(device, events.clone()));

        info!(
            playback = playback.is_some(),
            max_age_secs = config.cache.max_age.as_secs(),
            "Companion core ready"
        );

        Ok(Self {
            config: Arc::new(config),
            events,
            store,
            fetcher,
            content,
            playback,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// A new stream over every core event.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn quran(&self) -> &QuranAccessor {
        &self.content.quran
    }

    pub fn prayer(&self) -> &PrayerAccessor {
        &self.content.prayer
    }

    pub fn supplications(&self) -> &SupplicationAccessor {
        &self.content.supplication
    }

    pub fn hadith(&self) -> &HadithAccessor {
        &self.content.hadith
    }

    pub fn calendar(&self) -> &CalendarAccessor {
        &self.content.calendar
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Reciters available for verse and surah audio.
    pub fn qaris(&self) -> &'static [Qari] {
        Qari::all()
    }

    /// The playback controller, if the host supplied an audio device.
    pub fn playback(&self) -> Result<&PlaybackController> {
        self.playback.as_ref().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "audio_device".to_string(),
            message: "No audio device was configured. Call \
                      AppConfig::builder().audio_device(...) to enable playback."
                .to_string(),
        })
    }

    /// Guard that stops playback when the owning screen goes away.
    pub fn playback_scope(&self) -> Result<PlaybackScope> {
        Ok(self.playback()?.scope())
    }

    /// Recite a surah verse by verse, starting at `from_verse`.
    ///
    /// Verses without a recitation by `qari` are skipped, including
    /// `from_verse` itself. Fails with an empty-queue playback error when no
    /// verse from `from_verse` on has one.
    #[instrument(skip(self))]
    pub async fn play_verses(&self, surah: u16, qari: &str, from_verse: u16) -> Result<()> {
        let controller = self.playback()?;
        let detail = self.content.quran.get_surah_detail(surah).await?;
        controller
            .start(verse_queue_from(&detail, qari, from_verse))
            .await?;
        Ok(())
    }

    /// Recite a whole surah as a single item.
    #[instrument(skip(self))]
    pub async fn play_surah(&self, surah: u16, qari: &str) -> Result<()> {
        let controller = self.playback()?;
        let uri = self.content.quran.get_surah_audio_for(surah, qari).await?;
        controller
            .start(vec![PlaybackItem::new(uri, format!("{}", surah))])
            .await?;
        Ok(())
    }

    /// Stop playback if any is running.
    pub async fn stop_playback(&self) {
        if let Some(controller) = &self.playback {
            controller.stop().await;
        }
    }

    /// Drop every cached entry.
    pub async fn clear_cache(&self) -> CacheWrite {
        self.store.clear().await
    }
}

impl std::fmt::Debug for CompanionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionService")
            .field("config", &self.config)
            .field("playback", &self.playback.is_some())
            .finish()
    }
}

/// Initialize logging, then build the service.
///
/// A logging subscriber that is already installed is left in place.
pub fn bootstrap(config: AppConfig, logging: LoggingConfig) -> Result<CompanionService> {
    if let Err(err) = init_logging(logging) {
        warn!(error = %err, "Logging already initialized; keeping existing subscriber");
    }
    CompanionService::new(config)
}
