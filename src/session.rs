//! Per-session shared state and lifecycle tracking
//!
//! One `SessionShared` exists per streaming session, jointly owned by the
//! controller and both workers. It carries the single buffer lock, the
//! session-scoped cancellation flag (never process-global, so overlapping
//! restarts cannot interfere), the one-shot buffering/error latches, and the
//! session state machine.

use crate::buffer::ByteRingBuffer;
use crate::error::Error;
use crate::events::Notifier;
use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of one streaming session.
///
/// `Stopped` and `Errored` are terminal and mutually exclusive: whichever is
/// entered first absorbs all later transition attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Socket being opened, request being sent
    Connecting,
    /// Connected; buffer filling toward the threshold
    Buffering,
    /// Threshold reached; decode loop running
    Playing,
    /// Cancelled by the caller
    Stopped,
    /// Terminated by an unrecoverable error
    Errored,
}

/// State shared between the controller and the two worker threads.
pub(crate) struct SessionShared {
    /// Session id, for log correlation only
    pub id: Uuid,

    /// The one bounded buffer, inside the one lock both workers use for
    /// every read/write/full-check
    pub buffer: Mutex<ByteRingBuffer>,

    /// Fill level gating the buffering-to-playing transition
    pub threshold: usize,

    /// Tunables captured at session creation
    pub settings: Settings,

    /// Event fan-out; shared with the owning controller
    pub notifier: Arc<Notifier>,

    /// Cooperative cancellation flag, readable without the buffer lock
    cancelled: AtomicBool,

    /// One-shot latch: at most one fatal-error notification per session
    fatal_reported: AtomicBool,

    /// One-shot latch: buffering-complete fires exactly once
    buffering_complete: AtomicBool,

    /// Set by the ingest worker on exit so the consumer side stops waiting
    /// for bytes that will never come
    ingest_finished: AtomicBool,

    state: Mutex<StreamState>,
}

impl SessionShared {
    pub fn new(capacity: usize, settings: Settings, notifier: Arc<Notifier>) -> Self {
        let threshold = settings.buffering_threshold(capacity);
        Self {
            id: Uuid::new_v4(),
            buffer: Mutex::new(ByteRingBuffer::new(capacity)),
            threshold,
            settings,
            notifier,
            cancelled: AtomicBool::new(false),
            fatal_reported: AtomicBool::new(false),
            buffering_complete: AtomicBool::new(false),
            ingest_finished: AtomicBool::new(false),
            state: Mutex::new(StreamState::Connecting),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Mark the session cancelled and move it to Stopped.
    ///
    /// Idempotent; a session that already errored stays Errored.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            debug!(session = %self.id, "Cancel requested again; already cancelled");
            return;
        }
        info!(session = %self.id, "Session cancelled");
        self.advance(StreamState::Stopped);
    }

    pub fn ingest_finished(&self) -> bool {
        self.ingest_finished.load(Ordering::Acquire)
    }

    pub fn mark_ingest_finished(&self) {
        self.ingest_finished.store(true, Ordering::Release);
    }

    /// Current session state (point-in-time).
    pub fn state(&self) -> StreamState {
        *self.state.lock().unwrap()
    }

    /// Advance the state machine, ignoring transitions out of terminal states.
    pub fn advance(&self, to: StreamState) {
        let mut state = self.state.lock().unwrap();
        match *state {
            StreamState::Stopped | StreamState::Errored => {
                debug!(session = %self.id, from = ?*state, to = ?to,
                       "Ignoring transition out of terminal state");
            }
            from => {
                debug!(session = %self.id, from = ?from, to = ?to, "Session state change");
                *state = to;
            }
        }
    }

    /// Signal buffering complete, exactly once per session.
    pub fn signal_buffering_complete(&self) {
        if self.buffering_complete.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(session = %self.id, "Buffering complete");
        self.advance(StreamState::Playing);
        self.notifier.notify_buffering(false);
    }

    /// Map a worker failure into the session's single fatal-error notification.
    ///
    /// An error observed after cancellation was requested is swallowed rather
    /// than reported: the forced socket close fails the in-flight ingest
    /// read, and the caller already knows the session is going away.
    pub fn report_fatal(&self, error: &Error) {
        if self.is_cancelled() {
            debug!(session = %self.id, %error, "Suppressing error after cancellation");
            return;
        }
        if self.fatal_reported.swap(true, Ordering::AcqRel) {
            debug!(session = %self.id, %error, "Fatal error already reported");
            return;
        }
        warn!(session = %self.id, %error, "Fatal streaming error");
        self.advance(StreamState::Errored);
        self.notifier.notify_fatal_error();
    }
}
