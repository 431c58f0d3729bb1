//! Hadith collection accessor.

use core_cache::{FetchError, Fetcher, ResponseShape};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ContentError, Result};
use crate::models::{HadithBook, HadithRange};

const BOOKS_FAILED: &str = "Gagal mengambil data.";
const RANGE_FAILED: &str = "Gagal mengambil hadith.";

/// A page of a hadith collection.
///
/// Pages are 1-based; page `p` of size `s` covers hadiths
/// `(p-1)*s+1` through `(p-1)*s+s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HadithPage {
    pub page: u32,
    pub size: u32,
}

impl HadithPage {
    /// Page and size below 1 are raised to 1.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn start(&self) -> u64 {
        self.offset() + 1
    }

    /// Computed in `u64`, so any `u32` page and size are representable.
    pub fn end(&self) -> u64 {
        self.offset() + u64::from(self.size)
    }

    /// Whether the page lies inside the numbering a host can address.
    pub fn is_addressable(&self) -> bool {
        self.end() <= u64::from(u32::MAX)
    }

    /// The `"start-end"` range the host expects.
    pub fn range_spec(&self) -> String {
        format!("{}-{}", self.start(), self.end())
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }

    fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

impl fmt::Display for HadithPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range_spec())
    }
}

/// Accessor for the hadith host. Nothing here is cached.
#[derive(Debug, Clone)]
pub struct HadithAccessor {
    fetcher: Arc<Fetcher>,
    base_url: String,
    page_size: u32,
}

impl HadithAccessor {
    pub fn new(fetcher: Arc<Fetcher>, base_url: impl Into<String>, page_size: u32) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[instrument(skip(self))]
    pub async fn list_hadith_books(&self) -> Result<Vec<HadithBook>> {
        self.get(format!("{}/books", self.base_url), BOOKS_FAILED)
            .await
    }

    /// Hadiths `range_spec` (`"start-end"`) of a book.
    #[instrument(skip(self))]
    pub async fn get_hadith_range(&self, book_id: &str, range_spec: &str) -> Result<HadithRange> {
        let location = format!(
            "{}/books/{}?range={}",
            self.base_url,
            urlencoding::encode(book_id),
            range_spec
        );
        let range: HadithRange = self.get(location, RANGE_FAILED).await?;

        if range.hadiths.is_empty() {
            return Err(ContentError::not_found(format!(
                "No hadith {} in {}",
                range_spec, book_id
            )));
        }
        Ok(range)
    }

    /// Page `page` of a book at the configured page size.
    #[instrument(skip(self))]
    pub async fn get_hadith_page(&self, book_id: &str, page: u32) -> Result<HadithRange> {
        let page = HadithPage::new(page, self.page_size);
        if !page.is_addressable() {
            return Err(ContentError::not_found(format!(
                "No hadith {} in {}",
                page, book_id
            )));
        }
        self.get_hadith_range(book_id, &page.range_spec()).await
    }

    async fn get<T: DeserializeOwned>(&self, location: String, fallback: &str) -> Result<T> {
        let data = self
            .fetcher
            .fetch_uncached(&location, ResponseShape::DataField)
            .await
            .map_err(|e| failure(&e, fallback))?;
        serde_json::from_value(data).map_err(|e| ContentError::transient(e.to_string()))
    }
}

/// The host's own message when it sent one, otherwise a generic one.
fn failure(err: &FetchError, fallback: &str) -> ContentError {
    match err {
        FetchError::Status {
            message: Some(message),
            ..
        } => ContentError::transient(message.clone()),
        FetchError::Status { message: None, .. } => ContentError::transient(fallback),
        other => ContentError::transient(other.reason()),
    }
}
