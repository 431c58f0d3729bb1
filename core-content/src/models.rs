//! Normalized content models.
//!
//! The remote APIs use Indonesian field names; the models rename them and
//! accept the aliases seen across API versions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Audio URLs keyed by reciter code ("01".."05").
pub type AudioMap = BTreeMap<String, String>;

// =============================================================================
// Quran
// =============================================================================

/// One entry of the surah listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurahSummary {
    #[serde(rename = "nomor")]
    pub number: u16,
    #[serde(rename = "nama", default)]
    pub name_arabic: String,
    #[serde(rename = "namaLatin", default)]
    pub name_latin: String,
    #[serde(rename = "jumlahAyat", default)]
    pub verse_count: u16,
    #[serde(rename = "tempatTurun", default)]
    pub revelation_place: String,
    #[serde(rename = "arti", default)]
    pub meaning: String,
    #[serde(rename = "deskripsi", default)]
    pub description: String,
    /// Full-surah recitation per reciter.
    #[serde(rename = "audioFull", default)]
    pub audio_full: AudioMap,
}

/// A surah with all of its verses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurahDetail {
    #[serde(flatten)]
    pub summary: SurahSummary,
    #[serde(rename = "ayat", default)]
    pub verses: Vec<VerseEntry>,
}

impl SurahDetail {
    pub fn number(&self) -> u16 {
        self.summary.number
    }

    pub fn verse(&self, number: u16) -> Option<&VerseEntry> {
        self.verses.iter().find(|v| v.number == number)
    }
}

/// A single verse with its text views and per-reciter audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseEntry {
    #[serde(rename = "nomorAyat")]
    pub number: u16,
    #[serde(rename = "teksArab", default)]
    pub arabic: String,
    #[serde(rename = "teksLatin", default)]
    pub latin: String,
    #[serde(rename = "teksIndonesia", default)]
    pub translation: String,
    #[serde(default)]
    pub audio: AudioMap,
}

impl VerseEntry {
    pub fn audio_for(&self, qari: &str) -> Option<&str> {
        self.audio.get(qari).map(String::as_str)
    }
}

/// Commentary on one verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TafsirEntry {
    #[serde(rename = "ayat")]
    pub verse: u16,
    #[serde(rename = "teks", default)]
    pub text: String,
}

impl TafsirEntry {
    /// The commentary with markup tags removed.
    pub fn plain_text(&self) -> String {
        strip_tags(&self.text)
    }
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

// =============================================================================
// Prayer schedule
// =============================================================================

/// A city known to the prayer schedule host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerCity {
    pub id: String,
    pub name: String,
}

/// Prayer times of one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyPrayerTimes {
    /// Display date as sent by the host, e.g. "Jumat, 01/03/2024".
    #[serde(rename = "tanggal")]
    pub label: String,
    /// ISO date when the host sends one.
    pub date: Option<String>,
    #[serde(alias = "imsyak")]
    pub imsak: String,
    #[serde(alias = "shubuh")]
    pub subuh: String,
    pub terbit: String,
    pub dhuha: String,
    pub dzuhur: String,
    #[serde(alias = "ashr")]
    pub ashar: String,
    #[serde(alias = "magrib")]
    pub maghrib: String,
    pub isya: String,
}

impl DailyPrayerTimes {
    /// `(name, time)` pairs in the order they occur during the day.
    pub fn times(&self) -> [(&'static str, &str); 8] {
        [
            ("imsak", self.imsak.as_str()),
            ("subuh", self.subuh.as_str()),
            ("terbit", self.terbit.as_str()),
            ("dhuha", self.dhuha.as_str()),
            ("dzuhur", self.dzuhur.as_str()),
            ("ashar", self.ashar.as_str()),
            ("maghrib", self.maghrib.as_str()),
            ("isya", self.isya.as_str()),
        ]
    }
}

/// One month of prayer times for a city, indexed by day of month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSchedule {
    pub city_id: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyPrayerTimes>,
}

impl PrayerSchedule {
    /// Times for `day_of_month` (1-based).
    pub fn day(&self, day_of_month: u32) -> Option<&DailyPrayerTimes> {
        let index = usize::try_from(day_of_month.checked_sub(1)?).ok()?;
        self.days.get(index)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

// =============================================================================
// Supplications
// =============================================================================

/// A supplication (doa).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplication {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "doa", default)]
    pub title: String,
    #[serde(rename = "ayat", default)]
    pub arabic: String,
    #[serde(default)]
    pub latin: String,
    #[serde(rename = "artinya", default)]
    pub translation: String,
}

// =============================================================================
// Hadith
// =============================================================================

/// A hadith collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HadithBook {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Number of hadiths in the collection.
    #[serde(default)]
    pub available: u32,
}

/// A single hadith.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HadithEntry {
    pub number: u32,
    #[serde(rename = "arab", default)]
    pub arabic: String,
    /// The host names the translation field `id`.
    #[serde(rename = "id", default)]
    pub translation: String,
}

/// A contiguous slice of a hadith collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HadithRange {
    #[serde(rename = "id")]
    pub book: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub available: u32,
    #[serde(default)]
    pub requested: u32,
    #[serde(default)]
    pub hadiths: Vec<HadithEntry>,
}

/// Accept an identifier sent either as a string or as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_string(&value).ok_or_else(|| serde::de::Error::custom("expected a string or number id"))
}

/// Normalize a string or numeric JSON identifier.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
