//! Supplication (doa) accessor.
//!
//! The supplication host is never cached. Failures are reported as
//! [`ContentErrorKind::TransientFailure`](crate::ContentErrorKind) with the
//! host's message kept verbatim behind a short prefix.

use core_cache::{FetchError, Fetcher, ResponseShape};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ContentError, Result};
use crate::models::Supplication;

/// Accessor for the supplication host.
#[derive(Debug, Clone)]
pub struct SupplicationAccessor {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl SupplicationAccessor {
    pub fn new(fetcher: Arc<Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_supplications(&self) -> Result<Vec<Supplication>> {
        let body = self
            .get(self.base_url.clone(), "Error fetching all doa data")
            .await?;
        decode_many(body, "Error fetching all doa data")
    }

    #[instrument(skip(self))]
    pub async fn get_supplication_by_id(&self, id: &str) -> Result<Supplication> {
        let context = "Error fetching doa by id";
        let location = format!("{}/{}", self.base_url, urlencoding::encode(id));
        let body = self.get(location, context).await?;
        decode_one(body, context)?
            .ok_or_else(|| ContentError::not_found(format!("No doa with id {}", id)))
    }

    /// Supplications whose title matches `keyword`. A blank keyword lists all.
    #[instrument(skip(self))]
    pub async fn search_supplications_by_keyword(&self, keyword: &str) -> Result<Vec<Supplication>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list_supplications().await;
        }

        let context = "Error fetching doa by keyword";
        let location = format!("{}/doa/{}", self.base_url, urlencoding::encode(keyword));
        let body = self.get(location, context).await?;
        decode_many(body, context)
    }

    #[instrument(skip(self))]
    pub async fn get_random_supplication(&self) -> Result<Supplication> {
        let context = "Error fetching random doa";
        let location = format!("{}/doa/v1/random", self.base_url);
        let body = self.get(location, context).await?;
        decode_one(body, context)?
            .ok_or_else(|| ContentError::transient(format!("{}: empty response", context)))
    }

    async fn get(&self, location: String, context: &str) -> Result<Value> {
        self.fetcher
            .fetch_uncached(&location, ResponseShape::WholeBody)
            .await
            .map_err(|e| failure(context, &e))
    }
}

fn failure(context: &str, err: &FetchError) -> ContentError {
    ContentError::transient(format!("{}: {}", context, err.reason()))
}

/// The host answers with either a list or a single object.
fn decode_many(body: Value, context: &str) -> Result<Vec<Supplication>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| ContentError::transient(format!("{}: {}", context, e)))
        })
        .collect()
}

fn decode_one(body: Value, context: &str) -> Result<Option<Supplication>> {
    Ok(decode_many(body, context)?.into_iter().next())
}
