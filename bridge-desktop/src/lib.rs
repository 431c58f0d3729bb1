//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `KeyValueStore` using an SQLite-backed key-value table
//!
//! There is no desktop `AudioDevice`; the host embedding the core always
//! supplies its own audio engine.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteKeyValueStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new(Duration::from_secs(30))?;
//!     let store = SqliteKeyValueStore::new("companion/cache.db".into()).await?;
//!
//!     // Hand both to the core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod kv_store;

pub use http::ReqwestHttpClient;
pub use kv_store::SqliteKeyValueStore;
