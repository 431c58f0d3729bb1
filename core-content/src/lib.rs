//! # Content Module
//!
//! Domain accessors over the public content APIs. Each accessor builds the
//! remote location and cache key for a resource, goes through the shared
//! [`Fetcher`](core_cache::Fetcher) and normalizes the payload into typed
//! models.
//!
//! | Accessor | Host | Cached |
//! |---|---|---|
//! | [`QuranAccessor`] | Quran text, tafsir, recitations | yes |
//! | [`PrayerAccessor`] | prayer schedules | yes |
//! | [`SupplicationAccessor`] | supplications | no |
//! | [`HadithAccessor`] | hadith collections | no |
//! | [`CalendarAccessor`] | Gregorian to Hijri calendar | yes |
//!
//! Failures are [`ContentError`]s; see [`ContentErrorKind`] for how to react.

pub mod calendar;
pub mod error;
pub mod hadith;
pub mod models;
pub mod prayer;
pub mod qari;
pub mod quran;
pub mod supplication;

pub use calendar::{CalendarAccessor, HijriCalendarDay};
pub use error::{ContentError, ContentErrorKind, ContentResultExt, Result};
pub use hadith::{HadithAccessor, HadithPage};
pub use models::*;
pub use prayer::PrayerAccessor;
pub use qari::Qari;
pub use quran::QuranAccessor;
pub use supplication::SupplicationAccessor;

use core_cache::Fetcher;
use core_runtime::config::ApiEndpoints;
use std::sync::Arc;

/// Every accessor, wired to one fetcher.
#[derive(Debug, Clone)]
pub struct ContentAccessors {
    pub quran: QuranAccessor,
    pub prayer: PrayerAccessor,
    pub supplication: SupplicationAccessor,
    pub hadith: HadithAccessor,
    pub calendar: CalendarAccessor,
}

impl ContentAccessors {
    pub fn new(fetcher: Arc<Fetcher>, endpoints: &ApiEndpoints, hadith_page_size: u32) -> Self {
        Self {
            quran: QuranAccessor::new(fetcher.clone(), &endpoints.quran),
            prayer: PrayerAccessor::new(fetcher.clone(), &endpoints.prayer),
            supplication: SupplicationAccessor::new(fetcher.clone(), &endpoints.supplication),
            hadith: HadithAccessor::new(fetcher.clone(), &endpoints.hadith, hadith_page_size),
            calendar: CalendarAccessor::new(fetcher, &endpoints.calendar),
        }
    }
}
