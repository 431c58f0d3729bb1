//! # Event Bus
//!
//! Cache and playback activity is published on a `tokio::sync::broadcast`
//! channel so hosts can drive UI state (now-playing banners, offline
//! indicators) without polling.
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut events = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::NowPlaying {
//!     identifier: "1:1".to_string(),
//!     position_in_queue: 0,
//! }))
//! .ok();
//!
//! assert_eq!(events.recv().await.unwrap().description(), "Now playing");
//! # }
//! ```
//!
//! A subscriber that falls more than `capacity` events behind gets
//! `RecvError::Lagged` once and then continues with newer events. Emitting
//! with no subscribers is an error that producers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

use tokio::sync::broadcast::error::TryRecvError;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Cache and fetch events
    Cache(CacheEvent),
    /// Playback-related events
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::FetchFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::WriteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::Refreshed { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::NowPlaying { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Something degraded but the operation continued
    Warning,
    /// Operation failed
    Error,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the freshness-aware fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    /// A fresh cached entry answered the request.
    Hit {
        key: String,
        /// Age of the entry in seconds.
        age_secs: i64,
    },
    /// The network answered and the entry was replaced.
    Refreshed { key: String },
    /// The network answered but persisting the entry failed.
    WriteFailed { key: String, reason: String },
    /// The network call or its validation failed.
    FetchFailed { key: String, reason: String },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Hit { .. } => "Cache hit",
            CacheEvent::Refreshed { .. } => "Cache refreshed",
            CacheEvent::WriteFailed { .. } => "Cache write failed",
            CacheEvent::FetchFailed { .. } => "Fetch failed",
        }
    }

    /// Cache key the event refers to.
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Hit { key, .. }
            | CacheEvent::Refreshed { key }
            | CacheEvent::WriteFailed { key, .. }
            | CacheEvent::FetchFailed { key, .. } => key,
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the sequential playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// An item was loaded and started playing.
    NowPlaying {
        /// Identifier supplied with the item.
        identifier: String,
        /// Index of the item within the queue.
        position_in_queue: usize,
    },
    /// Playback paused.
    Paused {
        identifier: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Playback resumed after pause.
    Resumed { identifier: String },
    /// Playback stopped and the handle was released.
    Stopped { identifier: Option<String> },
    /// The last item of the queue finished.
    QueueFinished { identifier: String },
    /// Loading or playing failed; the controller went back to idle.
    Error {
        identifier: Option<String>,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::NowPlaying { .. } => "Now playing",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::QueueFinished { .. } => "Queue finished",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Cloneable handle to the broadcast channel. Every clone publishes to the
/// same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of subscribers reached, or an error when there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Events emitted from now on. Nothing is replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A subscription that skips events rejected by an optional predicate.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let playback = EventStream::playback(bus.subscribe());
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only playback events.
    pub fn playback(receiver: Receiver<CoreEvent>) -> Self {
        Self::new(receiver).filter(|event| matches!(event, CoreEvent::Playback(_)))
    }

    /// Only cache events.
    pub fn cache(receiver: Receiver<CoreEvent>) -> Self {
        Self::new(receiver).filter(|event| matches!(event, CoreEvent::Cache(_)))
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Next accepted event. Lag and closure are reported as errors.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Next accepted event already buffered, or `None`.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            };
            if self.accepts(&event) {
                return Some(Ok(event));
            }
        }
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now_playing(identifier: &str, position: usize) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::NowPlaying {
            identifier: identifier.to_string(),
            position_in_queue: position,
        })
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert!(bus.emit(now_playing("1:1", 0)).is_err());

        let _events = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.emit(now_playing("1:1", 0)).unwrap(), 1);
    }

    #[test]
    fn test_cache_stream_skips_playback() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::cache(bus.subscribe());

        bus.emit(now_playing("1:1", 0)).ok();
        assert!(stream.try_recv().is_none());

        let refreshed = CoreEvent::Cache(CacheEvent::Refreshed {
            key: "prayerCities".to_string(),
        });
        bus.emit(refreshed.clone()).ok();
        assert_eq!(stream.try_recv().unwrap().unwrap(), refreshed);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Cache(CacheEvent::Refreshed {
            key: "surahList".to_string(),
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::playback(bus.subscribe());

        bus.emit(CoreEvent::Cache(CacheEvent::Hit {
            key: "surah_1".to_string(),
            age_secs: 3600,
        }))
        .ok();
        let playback = now_playing("1:2", 1);
        bus.emit(playback.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), playback);
    }

    #[tokio::test]
    async fn test_try_recv_empty_and_lagged() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        for i in 0..5 {
            bus.emit(now_playing("x", i)).ok();
        }

        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(_)))));
    }

    #[test]
    fn test_severity_and_description() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            identifier: None,
            message: "decode failed".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(error.description(), "Playback error");

        let write_failed = CoreEvent::Cache(CacheEvent::WriteFailed {
            key: "prayerCities".to_string(),
            reason: "disk full".to_string(),
        });
        assert_eq!(write_failed.severity(), EventSeverity::Warning);

        let hit = CoreEvent::Cache(CacheEvent::Hit {
            key: "surahList".to_string(),
            age_secs: 1,
        });
        assert_eq!(hit.severity(), EventSeverity::Debug);
        if let CoreEvent::Cache(inner) = &hit {
            assert_eq!(inner.key(), "surahList");
        }
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = now_playing("2:255", 254);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Playback");
        assert_eq!(json["payload"]["event"], "now_playing");
        assert_eq!(json["payload"]["identifier"], "2:255");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
