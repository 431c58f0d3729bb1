//! Quran text, tafsir and recitation accessor.
//!
//! All resources come from the Quran host and go through the cache:
//!
//! | Resource | Cache key | Path |
//! |---|---|---|
//! | surah listing | `surahList` | `surat` |
//! | surah detail | `surahDetail_{n}` | `surat/{n}` |
//! | tafsir | `tafsir_{n}` | `tafsir/{n}` |
//! | tafsir of one verse | `tafsir_{n}_{v}` | derived from `tafsir_{n}` |

use core_cache::{FetchRequest, Fetcher};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{ContentError, Result};
use crate::models::{AudioMap, SurahDetail, SurahSummary, TafsirEntry};

#[derive(Debug, Deserialize)]
struct TafsirPayload {
    #[serde(default)]
    tafsir: Vec<TafsirEntry>,
}

/// Accessor for the Quran host.
#[derive(Debug, Clone)]
pub struct QuranAccessor {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl QuranAccessor {
    pub fn new(fetcher: Arc<Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// All 114 surahs.
    #[instrument(skip(self))]
    pub async fn list_surahs(&self) -> Result<Vec<SurahSummary>> {
        self.fetch_model(format!("{}/surat", self.base_url), "surahList".to_string())
            .await
    }

    /// Refetch the surah listing regardless of cache age.
    #[instrument(skip(self))]
    pub async fn refresh_surahs(&self) -> Result<Vec<SurahSummary>> {
        let location = format!("{}/surat", self.base_url);
        let outcome = self
            .fetcher
            .fetch_fresh(FetchRequest::new(&location, "surahList"))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;
        outcome
            .decode(&location)
            .map_err(|e| ContentError::from_cached_fetch(&e))
    }

    /// A surah with its verses.
    #[instrument(skip(self))]
    pub async fn get_surah_detail(&self, number: u16) -> Result<SurahDetail> {
        self.fetch_model(
            format!("{}/surat/{}", self.base_url, number),
            surah_detail_key(number),
        )
        .await
    }

    /// Tafsir of every verse of a surah.
    #[instrument(skip(self))]
    pub async fn get_tafsir(&self, number: u16) -> Result<Vec<TafsirEntry>> {
        let payload: TafsirPayload = self
            .fetch_model(
                format!("{}/tafsir/{}", self.base_url, number),
                tafsir_key(number),
            )
            .await?;
        Ok(payload.tafsir)
    }

    /// Tafsir of one verse.
    ///
    /// Per-verse entries are derived from the whole-surah entry and stamped
    /// with its `stored_at`; a per-verse hit is only trusted while the two
    /// timestamps still match.
    #[instrument(skip(self))]
    pub async fn get_tafsir_for_verse(&self, number: u16, verse: u16) -> Result<TafsirEntry> {
        let verse_key = format!("tafsir_{}_{}", number, verse);
        let surah_key = tafsir_key(number);

        if let Some(entry) = self.fetcher.cached(&verse_key, None).await {
            let surah_stored_at = self.fetcher.peek(&surah_key).await.map(|e| e.stored_at);
            if surah_stored_at == Some(entry.stored_at) {
                match serde_json::from_value::<TafsirEntry>(entry.payload) {
                    Ok(tafsir) => return Ok(tafsir),
                    Err(err) => warn!(key = %verse_key, error = %err, "Ignoring undecodable tafsir entry"),
                }
            } else {
                debug!(key = %verse_key, "Verse tafsir out of step with surah tafsir");
            }
        }

        let location = format!("{}/tafsir/{}", self.base_url, number);
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(&location, &surah_key))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;
        let payload: TafsirPayload = outcome
            .decode(&location)
            .map_err(|e| ContentError::from_cached_fetch(&e))?;

        let tafsir = payload
            .tafsir
            .into_iter()
            .find(|t| t.verse == verse)
            .ok_or_else(|| {
                ContentError::not_found(format!(
                    "Tafsir for verse {} of surah {} not found",
                    verse, number
                ))
            })?;

        match serde_json::to_value(&tafsir) {
            Ok(value) => {
                self.fetcher
                    .store()
                    .set(&verse_key, value, outcome.stored_at)
                    .await;
            }
            Err(err) => warn!(key = %verse_key, error = %err, "Could not encode verse tafsir"),
        }

        Ok(tafsir)
    }

    /// Full-surah recitation URLs for every reciter.
    #[instrument(skip(self))]
    pub async fn get_surah_audio(&self, number: u16) -> Result<AudioMap> {
        Ok(self.get_surah_detail(number).await?.summary.audio_full)
    }

    /// Full-surah recitation URL for one reciter.
    #[instrument(skip(self))]
    pub async fn get_surah_audio_for(&self, number: u16, qari: &str) -> Result<String> {
        let mut audio = self.get_surah_audio(number).await?;
        audio.remove(qari).ok_or_else(|| {
            ContentError::not_found(format!(
                "No recitation by qari {} for surah {}",
                qari, number
            ))
        })
    }

    /// Warm the detail cache before the surah screen opens.
    #[instrument(skip(self))]
    pub async fn prefetch_surah(&self, number: u16) -> Result<()> {
        let location = format!("{}/surat/{}", self.base_url, number);
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(location, surah_detail_key(number)))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;
        debug!(from_cache = outcome.is_from_cache(), "Surah detail warmed");
        Ok(())
    }

    async fn fetch_model<T: DeserializeOwned>(&self, location: String, key: String) -> Result<T> {
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(&location, key))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;
        outcome
            .decode(&location)
            .map_err(|e| ContentError::from_cached_fetch(&e))
    }
}

fn surah_detail_key(number: u16) -> String {
    format!("surahDetail_{}", number)
}

fn tafsir_key(number: u16) -> String {
    format!("tafsir_{}", number)
}
