//! # Sequential Playback Controller
//!
//! Plays a queue of [`PlaybackItem`]s one after another through the host
//! [`AudioDevice`], holding at most one loaded handle at a time.
//!
//! ```text
//!  Idle ──start──▶ Loading ──loaded──▶ Playing ◀──resume── Paused
//!   ▲                                   │   └────pause────▶ │
//!   │                                   │ completion        │
//!   │                         next? ────┴──▶ Loading        │
//!   └──── last item / stop() / failure ◀────────────────────┘
//! ```
//!
//! Every `start` and `stop` takes a new ticket. A load that finishes after its
//! ticket was superseded is unloaded without ever playing, and completion
//! notifications for handles that are no longer loaded are ignored.
//!
//! Loads are serialized by a gate held from `load` until the new handle is
//! either installed or unloaded, so the device never holds two handles.

use bridge_traits::{completion_channel, AudioDevice, AudioHandle, CompletionReceiver, CompletionSender};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::error::{PlaybackError, Result};
use crate::queue::{PlaybackItem, PlaybackQueue};
use crate::session::{NowPlaying, PlaybackSession, PlaybackState, SessionSnapshot};

/// Owner of the single playback session. Cheap to clone.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

struct Inner {
    device: Arc<dyn AudioDevice>,
    session: Mutex<PlaybackSession>,
    /// Held across `load` until the handle is installed or unloaded.
    /// Always taken before `session`.
    load_gate: Mutex<()>,
    /// Bumped under the session lock by every `start` and `stop`.
    ticket: AtomicU64,
    completion_tx: CompletionSender,
    completion_rx: StdMutex<Option<CompletionReceiver>>,
    now_playing: watch::Sender<Option<NowPlaying>>,
    events: Option<EventBus>,
}

impl PlaybackController {
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self::build(device, None)
    }

    /// Like [`new`](Self::new), also publishing [`PlaybackEvent`]s on `bus`.
    pub fn with_event_bus(device: Arc<dyn AudioDevice>, bus: EventBus) -> Self {
        Self::build(device, Some(bus))
    }

    fn build(device: Arc<dyn AudioDevice>, events: Option<EventBus>) -> Self {
        let (completion_tx, completion_rx) = completion_channel();
        let (now_playing, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                device,
                session: Mutex::new(PlaybackSession::new()),
                load_gate: Mutex::new(()),
                ticket: AtomicU64::new(0),
                completion_tx,
                completion_rx: StdMutex::new(Some(completion_rx)),
                now_playing,
                events,
            }),
        }
    }

    /// Replace whatever is playing with `items` and start the first one.
    ///
    /// Returns once the first item is playing. Fails with
    /// [`PlaybackError::Superseded`] if another `start` or `stop` came first.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn start(&self, items: Vec<PlaybackItem>) -> Result<()> {
        if items.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        self.inner.spawn_completion_listener();

        let (ticket, item) = {
            let mut session = self.inner.session.lock().await;
            let ticket = self.inner.next_ticket();
            self.inner.release(&mut session).await;

            session.queue = PlaybackQueue::new(items);
            session.state = PlaybackState::Loading;
            session.paused_at = None;
            let item = session.queue.current().cloned().ok_or(PlaybackError::EmptyQueue)?;
            (ticket, item)
        };

        self.inner.load_and_play(ticket, item).await
    }

    /// Play a single item.
    pub async fn play(&self, uri: impl Into<String>, identifier: impl Into<String>) -> Result<()> {
        self.start(vec![PlaybackItem::new(uri, identifier)]).await
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        let handle = match (session.state, session.handle) {
            (PlaybackState::Playing, Some(handle)) => handle,
            (state, _) => {
                return Err(PlaybackError::InvalidState {
                    operation: "pause",
                    state,
                })
            }
        };

        let position = self.inner.device.position(handle).await.unwrap_or_else(|err| {
            warn!(error = %err, "Could not read position before pausing");
            Duration::ZERO
        });
        self.inner.device.pause(handle).await?;

        session.state = PlaybackState::Paused;
        session.paused_at = Some(position);
        let identifier = session.active_identifier().unwrap_or_default();
        debug!(%identifier, position_ms = position.as_millis() as u64, "Paused");
        self.inner.emit(PlaybackEvent::Paused {
            identifier,
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        let handle = match (session.state, session.handle) {
            (PlaybackState::Paused, Some(handle)) => handle,
            (state, _) => {
                return Err(PlaybackError::InvalidState {
                    operation: "resume",
                    state,
                })
            }
        };

        self.inner.device.play(handle).await?;

        session.state = PlaybackState::Playing;
        session.paused_at = None;
        self.inner.emit(PlaybackEvent::Resumed {
            identifier: session.active_identifier().unwrap_or_default(),
        });
        Ok(())
    }

    /// Release the loaded handle and go back to `Idle`. Always succeeds.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut session = self.inner.session.lock().await;
        self.inner.next_ticket();
        self.inner.stop_locked(&mut session).await;
    }

    /// Current position of the loaded item, `None` when nothing is loaded.
    pub async fn position(&self) -> Result<Option<Duration>> {
        let session = self.inner.session.lock().await;
        match (session.state, session.handle) {
            (PlaybackState::Paused, Some(_)) if session.paused_at.is_some() => {
                Ok(session.paused_at)
            }
            (_, Some(handle)) => Ok(Some(self.inner.device.position(handle).await?)),
            (_, None) => Ok(None),
        }
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.session.lock().await.state
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().await.snapshot()
    }

    /// Watch the item currently playing; `None` while idle.
    pub fn subscribe_now_playing(&self) -> watch::Receiver<Option<NowPlaying>> {
        self.inner.now_playing.subscribe()
    }

    /// Guard that stops playback when dropped, for screens that own playback.
    pub fn scope(&self) -> PlaybackScope {
        PlaybackScope {
            controller: Some(self.clone()),
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("ticket", &self.inner.ticket.load(Ordering::SeqCst))
            .field("events", &self.inner.events.is_some())
            .finish()
    }
}

impl Inner {
    fn next_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.ticket.load(Ordering::SeqCst) == ticket
    }

    fn spawn_completion_listener(self: &Arc<Self>) {
        let receiver = self
            .completion_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(mut receiver) = receiver else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(handle) = receiver.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.on_completion(handle).await;
            }
            debug!("Completion listener finished");
        });
    }

    /// Load `item` and play it if `ticket` is still current.
    async fn load_and_play(&self, ticket: u64, item: PlaybackItem) -> Result<()> {
        let _gate = self.load_gate.lock().await;
        if !self.is_current(ticket) {
            debug!(identifier = %item.identifier, "Superseded before loading");
            return Err(PlaybackError::Superseded);
        }

        let loaded = self
            .device
            .load(&item.uri, self.completion_tx.clone())
            .await;

        let mut session = self.session.lock().await;

        if !self.is_current(ticket) {
            if let Ok(handle) = loaded {
                debug!(identifier = %item.identifier, "Load superseded, unloading");
                if let Err(err) = self.device.unload(handle).await {
                    warn!(error = %err, "Failed to unload superseded handle");
                }
            }
            return Err(PlaybackError::Superseded);
        }

        let handle = match loaded {
            Ok(handle) => handle,
            Err(source) => {
                let err = PlaybackError::LoadFailed {
                    identifier: item.identifier.clone(),
                    source,
                };
                self.fail(&mut session, Some(item.identifier), &err);
                return Err(err);
            }
        };

        session.handle = Some(handle);
        if let Err(source) = self.device.play(handle).await {
            self.release(&mut session).await;
            let err = PlaybackError::Device(source);
            self.fail(&mut session, Some(item.identifier), &err);
            return Err(err);
        }

        session.state = PlaybackState::Playing;
        let position_in_queue = session.queue.cursor();
        info!(identifier = %item.identifier, position_in_queue, "Now playing");
        self.now_playing.send_replace(session.now_playing());
        self.emit(PlaybackEvent::NowPlaying {
            identifier: item.identifier,
            position_in_queue,
        });
        Ok(())
    }

    async fn on_completion(&self, handle: AudioHandle) {
        let (ticket, next) = {
            let mut session = self.session.lock().await;
            if session.handle != Some(handle) || session.state != PlaybackState::Playing {
                debug!(%handle, "Ignoring completion for a handle that is not playing");
                return;
            }

            let finished = session.active_identifier().unwrap_or_default();
            self.release(&mut session).await;

            match session.queue.advance().cloned() {
                Some(next) => {
                    session.state = PlaybackState::Loading;
                    (self.next_ticket(), next)
                }
                None => {
                    info!(identifier = %finished, "Queue finished");
                    session.reset();
                    self.now_playing.send_replace(None);
                    self.emit(PlaybackEvent::QueueFinished {
                        identifier: finished,
                    });
                    return;
                }
            }
        };

        if let Err(err) = self.load_and_play(ticket, next).await {
            // Failures already reset the session; a superseded load needs nothing.
            debug!(error = %err, "Auto-advance ended");
        }
    }

    /// Stop and unload the current handle, if any.
    async fn release(&self, session: &mut PlaybackSession) {
        let Some(handle) = session.handle.take() else {
            return;
        };
        session.state = PlaybackState::Stopping;

        if let Err(err) = self.device.stop(handle).await {
            warn!(%handle, error = %err, "Failed to stop handle");
        }
        if let Err(err) = self.device.unload(handle).await {
            warn!(%handle, error = %err, "Failed to unload handle");
        }
    }

    async fn stop_locked(&self, session: &mut PlaybackSession) {
        let identifier = session.active_identifier();
        let was_active = session.state != PlaybackState::Idle;

        self.release(session).await;
        session.reset();
        self.now_playing.send_replace(None);

        if was_active {
            info!(identifier = identifier.as_deref().unwrap_or(""), "Playback stopped");
            self.emit(PlaybackEvent::Stopped { identifier });
        }
    }

    /// Stop only if nothing was started since `ticket` was observed.
    async fn stop_if_current(&self, ticket: u64) {
        let mut session = self.session.lock().await;
        if !self.is_current(ticket) {
            return;
        }
        self.next_ticket();
        self.stop_locked(&mut session).await;
    }

    fn fail(&self, session: &mut PlaybackSession, identifier: Option<String>, err: &PlaybackError) {
        warn!(error = %err, "Playback failed, returning to idle");
        session.reset();
        self.now_playing.send_replace(None);
        self.emit(PlaybackEvent::Error {
            identifier,
            message: err.to_string(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

/// Stops playback when dropped.
///
/// Hold one for the lifetime of a screen that plays audio. A `start` issued
/// after the guard is dropped is not affected by it.
#[must_use = "playback stops as soon as the scope is dropped"]
pub struct PlaybackScope {
    controller: Option<PlaybackController>,
}

impl PlaybackScope {
    pub fn controller(&self) -> Option<&PlaybackController> {
        self.controller.as_ref()
    }

    /// Stop now and disarm the guard.
    pub async fn close(mut self) {
        if let Some(controller) = self.controller.take() {
            controller.stop().await;
        }
    }
}

impl Drop for PlaybackScope {
    fn drop(&mut self) {
        let Some(controller) = self.controller.take() else {
            return;
        };
        let ticket = controller.inner.ticket.load(Ordering::SeqCst);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    controller.inner.stop_if_current(ticket).await;
                });
            }
            Err(_) => warn!("Playback scope dropped outside a runtime; playback not stopped"),
        }
    }
}

impl fmt::Debug for PlaybackScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackScope")
            .field("armed", &self.controller.is_some())
            .finish()
    }
}
