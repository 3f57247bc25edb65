//! Ingest worker: socket to ring buffer
//!
//! Connects, sends the request, then copies the response bytes into the
//! shared ring buffer until cancellation or failure. Backpressure is a fixed
//! sleep: when the buffer is full the worker parks for one poll interval and
//! checks again, never dropping or overwriting buffered bytes.

use crate::error::{Error, Result};
use crate::net::SocketTransport;
use crate::session::{SessionShared, StreamState};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub struct IngestWorker {
    shared: Arc<SessionShared>,
    transport: SocketTransport,
}

impl IngestWorker {
    pub fn new(shared: Arc<SessionShared>, transport: SocketTransport) -> Self {
        Self { shared, transport }
    }

    /// Run the ingest loop to completion.
    ///
    /// Owns the buffering(true) notification, the terminal bookkeeping for
    /// the producer side, and the socket teardown. Errors are routed through
    /// the session's single fatal-error gate.
    pub fn run(mut self) {
        self.shared.notifier.notify_buffering(true);

        let result = self.stream();

        self.shared.mark_ingest_finished();
        self.transport.close();

        if let Err(e) = result {
            self.shared.report_fatal(&e);
        }
        info!(session = %self.shared.id, "Ingest worker is terminating");
    }

    fn stream(&mut self) -> Result<()> {
        self.transport.connect()?;
        if self.shared.is_cancelled() {
            return Ok(());
        }
        self.transport.send_request()?;
        self.shared.advance(StreamState::Buffering);

        let poll = self.shared.settings.poll_interval();
        let mut chunk = vec![0u8; self.shared.settings.read_chunk_bytes];

        while !self.shared.is_cancelled() {
            // Size the read to the free space observed under the lock; the
            // lock is not held across the blocking socket read.
            let want = {
                let buffer = self.shared.buffer.lock().unwrap();
                buffer.free().min(chunk.len())
            };
            if want == 0 {
                thread::sleep(poll);
                continue;
            }

            let n = self.transport.read(&mut chunk[..want])?;
            if n == 0 {
                if self.shared.is_cancelled() {
                    break;
                }
                // Net-radio streams are unbounded; a server-side close is a
                // failure, not a normal end of stream.
                return Err(Error::Read("Stream ended unexpectedly".to_string()));
            }
            debug!(session = %self.shared.id, bytes = n, "Read from stream");

            // Partial-write contract: retry the remainder until it fits.
            let mut written = 0;
            while written < n && !self.shared.is_cancelled() {
                let w = self.shared.buffer.lock().unwrap().write(&chunk[written..n]);
                written += w;
                if w == 0 {
                    thread::sleep(poll);
                }
            }
        }
        Ok(())
    }
}
