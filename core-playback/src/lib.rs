//! # Playback Module
//!
//! Sequential audio playback over the host [`AudioDevice`](bridge_traits::AudioDevice).
//!
//! ## Overview
//!
//! - [`PlaybackController`] owns the single playback session: it loads one
//!   item at a time, auto-advances through the queue on completion and
//!   releases the handle on `stop`.
//! - [`PlaybackScope`] ties playback to the lifetime of a screen.
//! - [`PlaybackQueue`] / [`PlaybackItem`] describe what to play.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackController, PlaybackItem};
//!
//! let controller = PlaybackController::new(device);
//! let _scope = controller.scope();
//! controller
//!     .start(vec![
//!         PlaybackItem::new("https://cdn.example/001001.mp3", "1:1"),
//!         PlaybackItem::new("https://cdn.example/001002.mp3", "1:2"),
//!     ])
//!     .await?;
//! ```

pub mod controller;
pub mod error;
pub mod queue;
pub mod session;

pub use controller::{PlaybackController, PlaybackScope};
pub use error::{PlaybackError, Result};
pub use queue::{PlaybackItem, PlaybackQueue};
pub use session::{NowPlaying, PlaybackState, SessionSnapshot};
