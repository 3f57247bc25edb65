//! Streaming session controller
//!
//! The public entry point: owns the listener registry, starts sessions (one
//! live session at a time), and cancels them. Cancellation is cooperative with
//! one sharp edge: the socket is force-closed so an ingest thread parked in a
//! blocking read wakes up immediately instead of after the current packet.

use crate::audio::{AudioSink, DecoderFactory, KeepAwake};
use crate::error::{Error, Result};
use crate::events::{BufferingListener, ErrorListener, EventContext, Notifier};
use crate::ingest::IngestWorker;
use crate::net::{shutdown_socket, SocketSlot, SocketTransport, StreamUrl};
use crate::playback::PlaybackWorker;
use crate::session::{SessionShared, StreamState};
use crate::settings::Settings;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::info;

struct ActiveSession {
    shared: Arc<SessionShared>,
    socket: SocketSlot,
}

/// Controls net-radio streaming sessions.
///
/// One controller manages at most one live session; starting a replacement
/// requires cancelling the current one first. The controller itself is
/// `Send + Sync` and can be shared across threads behind an `Arc`.
pub struct StreamController {
    settings: Settings,
    notifier: Arc<Notifier>,
    active: Mutex<Option<ActiveSession>>,
}

impl StreamController {
    /// Create a controller with default settings.
    pub fn new(context: Arc<dyn EventContext>) -> Self {
        Self::with_settings(context, Settings::default())
    }

    /// Create a controller with explicit settings.
    pub fn with_settings(context: Arc<dyn EventContext>, settings: Settings) -> Self {
        Self {
            settings,
            notifier: Arc::new(Notifier::new(context)),
            active: Mutex::new(None),
        }
    }

    /// Register the buffering listener (replaces any previous one).
    pub fn set_buffering_listener(&self, listener: Option<BufferingListener>) {
        self.notifier.set_buffering_listener(listener);
    }

    /// Register the fatal-error listener (replaces any previous one).
    pub fn set_error_listener(&self, listener: Option<ErrorListener>) {
        self.notifier.set_error_listener(listener);
    }

    /// Start streaming from `url` at the advertised bitrate.
    ///
    /// Spawns the ingest and playback workers and returns immediately;
    /// progress is reported through the registered listeners. Fails with
    /// `InvalidState` if a previous session is still live. A session that
    /// has already stopped or errored does not block a replacement, so a
    /// caller retrying after a fatal error calls `start` directly; the old
    /// threads may still be winding down, which is fine.
    pub fn start(
        &self,
        url: StreamUrl,
        bitrate_kbps: u32,
        decoder_factory: Box<dyn DecoderFactory>,
        sink: Box<dyn AudioSink>,
        keep_awake: Box<dyn KeepAwake>,
    ) -> Result<()> {
        let mut active = self.active.lock().unwrap();
        if let Some(session) = active.as_ref() {
            // Stopped and Errored sessions are finished; their workers wind
            // down on session-scoped flags and do not block a replacement.
            if !matches!(
                session.shared.state(),
                StreamState::Stopped | StreamState::Errored
            ) {
                return Err(Error::InvalidState(
                    "A streaming session is already active".to_string(),
                ));
            }
        }

        let capacity = self.settings.buffer_capacity_for_bitrate(bitrate_kbps);
        let shared = Arc::new(SessionShared::new(
            capacity,
            self.settings.clone(),
            Arc::clone(&self.notifier),
        ));
        info!(session = %shared.id, %url, bitrate_kbps, capacity,
              "Starting streaming session");

        let socket: SocketSlot = Arc::new(Mutex::new(None));
        let transport = SocketTransport::new(url, Arc::clone(&socket));

        let ingest = IngestWorker::new(Arc::clone(&shared), transport);
        thread::Builder::new()
            .name("stream-ingest".into())
            .spawn(move || ingest.run())
            .map_err(|e| Error::Resource(format!("Failed to spawn ingest thread: {}", e)))?;

        let playback = PlaybackWorker::new(
            Arc::clone(&shared),
            decoder_factory,
            sink,
            keep_awake,
        );
        if let Err(e) = thread::Builder::new()
            .name("stream-playback".into())
            .spawn(move || playback.run())
        {
            // Don't leave the ingest thread running headless.
            shared.cancel();
            shutdown_socket(&socket);
            return Err(Error::Resource(format!(
                "Failed to spawn playback thread: {}",
                e
            )));
        }

        *active = Some(ActiveSession { shared, socket });
        Ok(())
    }

    /// Stop the live session, if any.
    ///
    /// Idempotent and non-blocking: listeners are detached first (so no event
    /// from the dying session is delivered), the cancel flag is set, and the
    /// socket is force-closed to unblock the ingest read. Worker threads
    /// observe the flag and exit on their own schedule.
    pub fn cancel(&self) {
        let active = self.active.lock().unwrap();
        if let Some(session) = active.as_ref() {
            self.notifier.clear_listeners();
            session.shared.cancel();
            shutdown_socket(&session.socket);
        }
    }

    /// Current session state, if a session exists.
    pub fn state(&self) -> Option<StreamState> {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.shared.state())
    }
}
