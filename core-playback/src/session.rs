//! Playback session state.

use bridge_traits::AudioHandle;
use serde::Serialize;
use std::time::Duration;

use crate::queue::{PlaybackItem, PlaybackQueue};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    /// Nothing loaded.
    Idle,
    /// Waiting for the device to load the current item.
    Loading,
    /// The current item is playing.
    Playing,
    /// The current item is loaded but paused.
    Paused,
    /// The loaded handle is being released.
    Stopping,
}

impl PlaybackState {
    /// Returns `true` if a session is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Paused)
    }
}

/// The item currently playing, as published on the `now_playing` channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub identifier: String,
    pub position_in_queue: usize,
    pub queue_len: usize,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub active_identifier: Option<String>,
    pub queue_cursor: usize,
    pub queue_len: usize,
    pub has_loaded_handle: bool,
}

/// The one playback session owned by the controller.
#[derive(Debug)]
pub(crate) struct PlaybackSession {
    pub(crate) state: PlaybackState,
    pub(crate) queue: PlaybackQueue,
    pub(crate) handle: Option<AudioHandle>,
    pub(crate) paused_at: Option<Duration>,
}

impl PlaybackSession {
    pub(crate) fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            queue: PlaybackQueue::default(),
            handle: None,
            paused_at: None,
        }
    }

    pub(crate) fn active_item(&self) -> Option<&PlaybackItem> {
        if self.state == PlaybackState::Idle {
            return None;
        }
        self.queue.current()
    }

    pub(crate) fn active_identifier(&self) -> Option<String> {
        self.active_item().map(|item| item.identifier.clone())
    }

    pub(crate) fn now_playing(&self) -> Option<NowPlaying> {
        self.active_item().map(|item| NowPlaying {
            identifier: item.identifier.clone(),
            position_in_queue: self.queue.cursor(),
            queue_len: self.queue.len(),
        })
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            active_identifier: self.active_identifier(),
            queue_cursor: self.queue.cursor(),
            queue_len: self.queue.len(),
            has_loaded_handle: self.handle.is_some(),
        }
    }

    /// Back to `Idle` with an empty queue. The handle must already be released.
    pub(crate) fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.queue.clear();
        self.handle = None;
        self.paused_at = None;
    }
}
