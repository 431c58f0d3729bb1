//! # Playback Error Types
//!
//! Error types for the sequential playback controller.

use bridge_traits::BridgeError;
use thiserror::Error;

use crate::session::PlaybackState;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// `start` was called with nothing to play.
    #[error("Nothing to play: the queue is empty")]
    EmptyQueue,

    /// The operation does not apply in the current state.
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: PlaybackState,
    },

    /// A later `start` or `stop` replaced this request before it finished.
    #[error("Playback request superseded")]
    Superseded,

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The audio device could not load the item.
    #[error("Failed to load {identifier}: {source}")]
    LoadFailed {
        identifier: String,
        #[source]
        source: BridgeError,
    },

    /// The audio device failed to play, pause or resume.
    #[error("Audio device error: {0}")]
    Device(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the audio device reported the failure.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed { .. } | PlaybackError::Device(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
