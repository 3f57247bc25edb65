//! Listener notification for buffering and error events
//!
//! Worker threads never invoke listener code directly: every notification is
//! posted as a job to a caller-chosen execution context, decoupling listener
//! latency (UI updates, restart policy) from the streaming loops. One
//! listener per event type; setting a new one replaces the old.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

/// Execution context that listener callbacks are posted to.
///
/// Implementations decide where the job runs (a dispatch thread, a UI loop,
/// an inline test harness); the only contract is that `post` does not run the
/// job on the calling worker thread's time-critical path for long.
pub trait EventContext: Send + Sync {
    /// Queue a job for execution on this context.
    fn post(&self, job: Box<dyn FnOnce() + Send>);
}

/// Default `EventContext`: a single named dispatch thread draining a queue.
///
/// Dropping the context closes the queue and lets the thread exit after
/// running any jobs already posted.
pub struct DispatchThread {
    tx: Mutex<Option<mpsc::Sender<Box<dyn FnOnce() + Send>>>>,
}

impl DispatchThread {
    /// Spawn the dispatch thread.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Box<dyn FnOnce() + Send>>();
        // The handle is intentionally detached; the thread exits when the
        // sender side is dropped.
        let builder = thread::Builder::new().name("stream-events".into());
        if let Err(e) = builder.spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
            debug!("Event dispatch thread is terminating");
        }) {
            warn!("Failed to spawn event dispatch thread: {}", e);
        }
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl Default for DispatchThread {
    fn default() -> Self {
        Self::new()
    }
}

impl EventContext for DispatchThread {
    fn post(&self, job: Box<dyn FnOnce() + Send>) {
        if let Some(tx) = self.tx.lock().unwrap().as_ref() {
            // A send failure means the dispatch thread is gone; events at
            // that point have nowhere to go.
            if tx.send(job).is_err() {
                debug!("Dropping event: dispatch thread has exited");
            }
        }
    }
}

/// Listener invoked on buffering state changes (`true` = buffering).
pub type BufferingListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Listener invoked on a fatal streaming error.
pub type ErrorListener = Arc<dyn Fn() + Send + Sync>;

/// Dispatches buffering/error events to the registered listeners.
///
/// One listener of each kind; setting a new one replaces the old. Both slots
/// are cleared as part of `StreamController::cancel()`, so a listener never
/// observes events from a session it asked to stop.
pub struct Notifier {
    context: Arc<dyn EventContext>,
    buffering: Mutex<Option<BufferingListener>>,
    error: Mutex<Option<ErrorListener>>,
}

impl Notifier {
    /// Create a notifier posting to the given context.
    pub fn new(context: Arc<dyn EventContext>) -> Self {
        Self {
            context,
            buffering: Mutex::new(None),
            error: Mutex::new(None),
        }
    }

    /// Replace the buffering listener.
    pub fn set_buffering_listener(&self, listener: Option<BufferingListener>) {
        *self.buffering.lock().unwrap() = listener;
    }

    /// Replace the error listener.
    pub fn set_error_listener(&self, listener: Option<ErrorListener>) {
        *self.error.lock().unwrap() = listener;
    }

    /// Drop both listeners; subsequent notifications go nowhere.
    pub fn clear_listeners(&self) {
        *self.buffering.lock().unwrap() = None;
        *self.error.lock().unwrap() = None;
    }

    /// Post a buffering state change to the registered listener, if any.
    pub fn notify_buffering(&self, is_buffering: bool) {
        let listener = self.buffering.lock().unwrap().clone();
        if let Some(listener) = listener {
            self.context
                .post(Box::new(move || listener(is_buffering)));
        }
    }

    /// Post a fatal error to the registered listener, if any.
    pub fn notify_fatal_error(&self) {
        let listener = self.error.lock().unwrap().clone();
        if let Some(listener) = listener {
            self.context.post(Box::new(move || listener()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Runs jobs inline on the caller's thread; test-only.
    struct InlineContext;

    impl EventContext for InlineContext {
        fn post(&self, job: Box<dyn FnOnce() + Send>) {
            job();
        }
    }

    #[test]
    fn test_notify_without_listener_is_silent() {
        let notifier = Notifier::new(Arc::new(InlineContext));
        notifier.notify_buffering(true);
        notifier.notify_fatal_error();
    }

    #[test]
    fn test_listener_receives_events() {
        let notifier = Notifier::new(Arc::new(InlineContext));
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        notifier.set_buffering_listener(Some(Arc::new(move |is_buffering| {
            if !is_buffering {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }
        })));

        notifier.notify_buffering(true);
        notifier.notify_buffering(false);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_listeners_stops_delivery() {
        let notifier = Notifier::new(Arc::new(InlineContext));
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        notifier.set_error_listener(Some(Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })));

        notifier.notify_fatal_error();
        notifier.clear_listeners();
        notifier.notify_fatal_error();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_thread_runs_jobs_off_caller() {
        let context = DispatchThread::new();
        let (tx, rx) = mpsc::channel();
        context.post(Box::new(move || {
            tx.send(thread::current().name().map(String::from)).unwrap();
        }));
        let name = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("stream-events"));
    }
}
