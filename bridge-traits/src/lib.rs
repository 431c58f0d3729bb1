//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the companion core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations against the content APIs
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable string key-value storage for the cache
//!
//! ### Audio
//! - [`AudioDevice`](playback::AudioDevice) - Load/play/pause/stop/unload of audio resources
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ HTTP + key-value store |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! The audio device has no desktop default; hosts always inject their own.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError` and
//! include context (URL, key, handle) in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across async
//! tasks behind an `Arc`.

pub mod error;
pub mod http;
pub mod log;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
pub use playback::{
    completion_channel, AudioDevice, AudioHandle, CompletionReceiver, CompletionSender,
};
pub use storage::KeyValueStore;
pub use log::{LogEntry, LogLevel, LoggerSink, MemoryLogSink};
pub use time::{Clock, ManualClock, SystemClock};
