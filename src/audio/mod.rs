//! External audio capabilities: decode and output seams
//!
//! Decoding the compressed bitstream into PCM and the audio output device are
//! consumed by the streaming core through the traits in this module. The
//! crate ships a symphonia-backed decoder and a cpal-backed sink, but the
//! playback worker only ever sees the trait objects, which is also what the
//! tests exploit.

pub mod output;
pub mod symphonia;

use crate::error::Result;
use std::io::Read;

pub use output::CpalSink;
pub use symphonia::SymphoniaDecoderFactory;

/// Sample rate and channel layout of a block of PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count (1 = mono, 2 = stereo)
    pub channels: u16,
}

/// One decoded block of interleaved f32 samples in [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct PcmBlock {
    /// Format of this block; may change between blocks mid-stream
    pub spec: AudioSpec,
    /// Interleaved samples, `spec.channels` per frame
    pub samples: Vec<f32>,
}

/// One open decode session over a compressed byte source.
///
/// The decoder pulls compressed bytes from the `Read` source it was opened
/// with; frame-boundary knowledge lives entirely behind this trait.
pub trait Decoder: Send {
    /// Run one decode step.
    ///
    /// Returns the next block of PCM, `Ok(None)` at end of stream, or an
    /// error for an unrecoverable decoder failure. Implementations are
    /// expected to skip over isolated undecodable frames rather than fail.
    fn next_block(&mut self) -> Result<Option<PcmBlock>>;
}

/// Opens decoders over a byte source.
///
/// `open` may block reading from `source` until enough bytes arrive to
/// identify the stream; the playback worker calls it only after the
/// buffering threshold has been reached.
pub trait DecoderFactory: Send {
    fn open(&self, source: Box<dyn Read + Send + Sync>) -> Result<Box<dyn Decoder>>;
}

/// Audio output device consuming interleaved f32 PCM.
pub trait AudioSink: Send {
    /// (Re)open the output for this format.
    ///
    /// Called before the first write and again whenever the stream's sample
    /// rate or channel count changes; any previous stream is torn down first.
    fn configure(&mut self, spec: AudioSpec) -> Result<()>;

    /// Write one block of interleaved samples, blocking until accepted.
    fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Stop and release the output. Safe to call when never configured.
    fn stop(&mut self);
}

/// OS facility preventing CPU suspension during latency-sensitive decode work.
///
/// Acquired once the buffering gate opens and released unconditionally on
/// every playback exit path. Hosts without a suspend concern use
/// [`crate::power::NoKeepAwake`].
pub trait KeepAwake: Send {
    /// Acquire the keep-awake handle; failure is fatal to the session.
    fn acquire(&mut self) -> Result<()>;

    /// Release the handle. Must be a no-op when not held.
    fn release(&mut self);
}
