//! Audio device bridge trait and supporting types.
//!
//! The host owns the actual audio engine (AVPlayer, ExoPlayer, expo-av, a
//! desktop sink). The core only needs to load a URI into an opaque handle,
//! drive it, and hear back when it finishes.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque handle to an audio resource loaded by the host device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(Uuid);

impl AudioHandle {
    /// Generate a new handle identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct a handle from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AudioHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel the device uses to report that playback of a handle finished.
///
/// Devices must send each handle at most once, and only when playback ran to
/// the end (not on `stop` or `unload`).
pub type CompletionSender = mpsc::UnboundedSender<AudioHandle>;

/// Receiving side of [`CompletionSender`].
pub type CompletionReceiver = mpsc::UnboundedReceiver<AudioHandle>;

/// Create a completion channel pair.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::unbounded_channel()
}

/// Trait for host audio devices.
///
/// # Contract
///
/// - `load` acquires a new resource; failure (bad URL, decode error) is an error.
/// - `play`/`pause`/`stop` act on a loaded handle.
/// - `unload` releases the handle; the handle is invalid afterwards.
/// - When playback of a handle reaches its end, the device sends the handle on
///   the `completion` sender given to `load`, exactly once.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Load the audio at `uri` and return a handle for it.
    async fn load(&self, uri: &str, completion: CompletionSender) -> Result<AudioHandle>;

    /// Begin or resume playback.
    async fn play(&self, handle: AudioHandle) -> Result<()>;

    /// Pause playback without releasing the handle.
    async fn pause(&self, handle: AudioHandle) -> Result<()>;

    /// Stop playback and rewind.
    async fn stop(&self, handle: AudioHandle) -> Result<()>;

    /// Release the handle.
    async fn unload(&self, handle: AudioHandle) -> Result<()>;

    /// Current playback position of the handle.
    async fn position(&self, handle: AudioHandle) -> Result<Duration>;
}
