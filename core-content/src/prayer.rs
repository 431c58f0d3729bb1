//! Prayer schedule accessor.

use chrono::{Datelike, NaiveDate};
use core_cache::{FetchRequest, Fetcher};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ContentError, Result};
use crate::models::{id_string, DailyPrayerTimes, PrayerCity, PrayerSchedule};

const UNKNOWN_CITY: &str = "Tidak diketahui";

/// Accessor for the prayer schedule host.
#[derive(Debug, Clone)]
pub struct PrayerAccessor {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl PrayerAccessor {
    pub fn new(fetcher: Arc<Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// Every city, sorted by name. Entries without an id are dropped.
    #[instrument(skip(self))]
    pub async fn list_cities(&self) -> Result<Vec<PrayerCity>> {
        let location = format!("{}/kota/semua", self.base_url);
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(&location, "prayerCities"))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;

        let Value::Array(items) = outcome.data else {
            return Err(ContentError::empty(format!(
                "City data from {} is not a list",
                location
            )));
        };

        let mut cities: Vec<PrayerCity> = items.iter().filter_map(parse_city).collect();
        cities.sort_by(|a, b| compare_names(&a.name, &b.name));
        debug!(count = cities.len(), "Loaded prayer cities");
        Ok(cities)
    }

    /// One month of prayer times for a city.
    #[instrument(skip(self))]
    pub async fn get_prayer_times(
        &self,
        city_id: &str,
        year: i32,
        month: u32,
    ) -> Result<PrayerSchedule> {
        if !(1..=12).contains(&month) {
            return Err(ContentError::not_found(format!(
                "No schedule for month {}",
                month
            )));
        }

        let location = format!(
            "{}/jadwal/{}/{}/{:02}",
            self.base_url,
            urlencoding::encode(city_id),
            year,
            month
        );
        let key = format!("prayerTimes_{}_{}_{}", city_id, year, month);
        let outcome = self
            .fetcher
            .fetch(FetchRequest::new(&location, key))
            .await
            .map_err(|e| ContentError::from_cached_fetch(&e))?;

        // The host sends either the day list itself or an object wrapping it.
        let days = match outcome.data {
            Value::Object(mut map) => map.remove("jadwal").unwrap_or(Value::Null),
            other => other,
        };
        let days: Vec<DailyPrayerTimes> = serde_json::from_value(days).map_err(|e| {
            ContentError::empty(format!("Unexpected schedule from {}: {}", location, e))
        })?;

        Ok(PrayerSchedule {
            city_id: city_id.to_string(),
            year,
            month,
            days,
        })
    }

    /// Prayer times of a single day.
    #[instrument(skip(self))]
    pub async fn schedule_for_date(
        &self,
        city_id: &str,
        date: NaiveDate,
    ) -> Result<DailyPrayerTimes> {
        let schedule = self
            .get_prayer_times(city_id, date.year(), date.month())
            .await?;
        schedule
            .day(date.day())
            .cloned()
            .ok_or_else(|| ContentError::not_found(format!("No schedule for {}", date)))
    }
}

fn parse_city(item: &Value) -> Option<PrayerCity> {
    let id = item.get("id").and_then(id_string)?;
    let name = ["lokasi", "nama", "name"]
        .iter()
        .find_map(|field| item.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_CITY)
        .to_string();
    Some(PrayerCity { id, name })
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
