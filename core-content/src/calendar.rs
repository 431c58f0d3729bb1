//! Gregorian to Hijri calendar accessor.

use chrono::{Datelike, NaiveDate, Weekday};
use core_cache::{FetchRequest, Fetcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ContentError, Result};

/// Hijri month names, Muharram first.
pub const HIJRI_MONTHS: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi al-Awwal",
    "Rabi al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qa'dah",
    "Dhu al-Hijjah",
];

/// One Gregorian day and its Hijri date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HijriCalendarDay {
    pub gregorian: NaiveDate,
    pub weekday: Weekday,
    pub hijri_day: u32,
    pub hijri_month: u32,
    pub hijri_year: i32,
}

impl HijriCalendarDay {
    pub fn hijri_month_name(&self) -> &'static str {
        hijri_month_name(self.hijri_month).unwrap_or("")
    }

    /// Short Indonesian weekday name ("Min" for Sunday).
    pub fn weekday_short(&self) -> &'static str {
        match self.weekday {
            Weekday::Sun => "Min",
            Weekday::Mon => "Sen",
            Weekday::Tue => "Sel",
            Weekday::Wed => "Rab",
            Weekday::Thu => "Kam",
            Weekday::Fri => "Jum",
            Weekday::Sat => "Sab",
        }
    }
}

pub fn hijri_month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    HIJRI_MONTHS.get(index).copied()
}

#[derive(Deserialize)]
struct RawDay {
    hijri: RawHijri,
    gregorian: RawGregorian,
}

#[derive(Deserialize)]
struct RawHijri {
    day: Value,
    month: RawMonth,
    year: Value,
}

#[derive(Deserialize)]
struct RawMonth {
    number: Value,
}

#[derive(Deserialize)]
struct RawGregorian {
    /// `DD-MM-YYYY`
    date: String,
}

impl RawDay {
    fn normalize(self) -> Option<HijriCalendarDay> {
        let gregorian = NaiveDate::parse_from_str(&self.gregorian.date, "%d-%m-%Y").ok()?;
        Some(HijriCalendarDay {
            gregorian,
            weekday: gregorian.weekday(),
            hijri_day: number(&self.hijri.day)?,
            hijri_month: number(&self.hijri.month.number)?,
            hijri_year: i32::try_from(number(&self.hijri.year)?).ok()?,
        })
    }
}

/// The host mixes numeric strings and numbers.
fn number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accessor for the calendar host.
#[derive(Debug, Clone)]
pub struct CalendarAccessor {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl CalendarAccessor {
    pub fn new(fetcher: Arc<Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// Hijri dates for every day of a Gregorian month.
    #[instrument(skip(self))]
    pub async fn get_hijri_calendar(&self, month: u32, year: i32) -> Result<Vec<HijriCalendarDay>> {
        if !(1..=12).contains(&month) {
            return Err(ContentError::not_found(format!("No calendar for month {}", month)));
        }

        let location = format!(
            "{}/gToHCalendar/{}/{}?calendarMethod=HJCoSA",
            self.base_url, month, year
        );
        let key = format!("hijriCalendar_{}_{}", year, month);
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(&location, key))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;
        let days: Vec<RawDay> = outcome
            .decode(&location)
            .map_err(|e| ContentError::from_cached_fetch(&e))?;

        let days: Option<Vec<HijriCalendarDay>> = days.into_iter().map(RawDay::normalize).collect();
        days.ok_or_else(|| ContentError::empty(format!("Unreadable calendar from {}", location)))
    }
}
