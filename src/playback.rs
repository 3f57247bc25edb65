//! Playback worker: ring buffer to decoder to audio sink
//!
//! Waits for the buffering threshold, then drives the decoder over a blocking
//! reader view of the ring buffer and pushes PCM into the sink. The keep-awake
//! handle is held for exactly the decoding span and released on every exit
//! path.

use crate::audio::{AudioSink, AudioSpec, DecoderFactory, KeepAwake};
use crate::error::Result;
use crate::session::SessionShared;
use std::io::{self, Read};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub struct PlaybackWorker {
    shared: Arc<SessionShared>,
    decoder_factory: Box<dyn DecoderFactory>,
    sink: Box<dyn AudioSink>,
    keep_awake: Box<dyn KeepAwake>,
}

impl PlaybackWorker {
    pub fn new(
        shared: Arc<SessionShared>,
        decoder_factory: Box<dyn DecoderFactory>,
        sink: Box<dyn AudioSink>,
        keep_awake: Box<dyn KeepAwake>,
    ) -> Self {
        Self {
            shared,
            decoder_factory,
            sink,
            keep_awake,
        }
    }

    pub fn run(mut self) {
        let result = self.stream();
        self.sink.stop();
        if let Err(e) = result {
            self.shared.report_fatal(&e);
        }
        info!(session = %self.shared.id, "Playback worker is terminating");
    }

    fn stream(&mut self) -> Result<()> {
        if !self.wait_for_threshold() {
            return Ok(());
        }
        self.shared.signal_buffering_complete();

        self.keep_awake.acquire()?;
        let result = self.decode_loop();
        self.keep_awake.release();
        result
    }

    /// Poll until the buffer reaches the playback threshold.
    ///
    /// Returns false when the session ends before the threshold is reached:
    /// cancellation, or the ingest side finishing (it only finishes early on
    /// error, and that error is already being reported).
    fn wait_for_threshold(&self) -> bool {
        let poll = self.shared.settings.poll_interval();
        loop {
            if self.shared.is_cancelled() {
                return false;
            }
            if self.shared.buffer.lock().unwrap().len() >= self.shared.threshold {
                debug!(session = %self.shared.id, threshold = self.shared.threshold,
                       "Buffering threshold reached");
                return true;
            }
            if self.shared.ingest_finished() {
                return false;
            }
            thread::sleep(poll);
        }
    }

    fn decode_loop(&mut self) -> Result<()> {
        let source = BufferReader::new(Arc::clone(&self.shared));
        let mut decoder = self.decoder_factory.open(Box::new(source))?;

        let mut current_spec: Option<AudioSpec> = None;
        while !self.shared.is_cancelled() {
            let block = match decoder.next_block()? {
                Some(block) => block,
                None => break,
            };
            // Net-radio streams can switch format between songs; reconfigure
            // the sink when the block's spec differs from the open stream.
            if current_spec != Some(block.spec) {
                debug!(session = %self.shared.id, rate = block.spec.sample_rate,
                       channels = block.spec.channels, "Configuring audio output");
                self.sink.configure(block.spec)?;
                current_spec = Some(block.spec);
            }
            self.sink.write(&block.samples)?;
        }
        Ok(())
    }
}

/// Blocking `Read` view of the session's ring buffer, handed to the decoder.
///
/// Blocks (in poll-interval steps) while the buffer is empty and the session
/// is live; reports end-of-file once the session is cancelled or the ingest
/// side has finished and the buffer has drained.
pub(crate) struct BufferReader {
    shared: Arc<SessionShared>,
}

impl BufferReader {
    pub fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }
}

impl Read for BufferReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let poll = self.shared.settings.poll_interval();
        loop {
            if self.shared.is_cancelled() {
                return Ok(0);
            }
            let n = self.shared.buffer.lock().unwrap().read(out);
            if n > 0 {
                return Ok(n);
            }
            if self.shared.ingest_finished() {
                return Ok(0);
            }
            thread::sleep(poll);
        }
    }
}
