//! # Local Cache Module
//!
//! The caching and data-freshness layer that sits between the content
//! accessors and the remote APIs.
//!
//! ## Overview
//!
//! - [`CacheStore`](store::CacheStore) persists JSON payloads with the time
//!   they were stored, through the host [`KeyValueStore`](bridge_traits::KeyValueStore).
//!   Failures are logged and reported as absent/failed, never propagated.
//! - [`Fetcher`](fetcher::Fetcher) answers from the store while an entry is
//!   younger than its staleness window, otherwise calls the network, validates
//!   the response shape and repopulates the store.
//!
//! An expired entry is never served as a fallback when the network fails.
//!
//! ## Usage
//!
//! ```ignore
//! use core_cache::{CacheStore, Fetcher, FetchRequest};
//! use std::sync::Arc;
//!
//! let store = Arc::new(CacheStore::new(kv_store, 64));
//! let fetcher = Fetcher::new(http_client, store, clock, max_age);
//!
//! let outcome = fetcher
//!     .fetch(FetchRequest::new("https://equran.id/api/v2/surat", "surahList"))
//!     .await?;
//! ```

pub mod error;
pub mod fetcher;
pub mod store;

pub use error::{CacheError, FetchError, Result};
pub use fetcher::{FetchOutcome, FetchRequest, FetchSource, Fetcher, ResponseShape};
pub use store::{CacheEntry, CacheStore, CacheWrite};
