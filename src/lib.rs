//! shoutstream - Net-radio streaming playback core
//!
//! Streams Shoutcast-style net radio over raw TCP: an ingest thread fills a
//! bounded ring buffer from the socket while a playback thread drains it
//! through a decoder into an audio sink. Playback starts once the buffer
//! passes its fill threshold; errors and buffering transitions are reported
//! through registered listeners on a caller-chosen event context.
//!
//! ```no_run
//! use shoutstream::audio::{CpalSink, SymphoniaDecoderFactory};
//! use shoutstream::{DispatchThread, NoKeepAwake, StreamController};
//! use std::sync::Arc;
//!
//! # fn main() -> shoutstream::Result<()> {
//! let controller = StreamController::new(Arc::new(DispatchThread::new()));
//! controller.set_error_listener(Some(Arc::new(|| eprintln!("stream failed"))));
//! controller.start(
//!     "http://radio.example.com:8000/stream.mp3".parse()?,
//!     128,
//!     Box::new(SymphoniaDecoderFactory::new()),
//!     Box::new(CpalSink::new()),
//!     Box::new(NoKeepAwake),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod buffer;
pub mod controller;
pub mod error;
pub mod events;
mod ingest;
pub mod net;
mod playback;
pub mod power;
pub mod session;
pub mod settings;

pub use audio::{AudioSink, AudioSpec, Decoder, DecoderFactory, KeepAwake, PcmBlock};
pub use controller::StreamController;
pub use error::{Error, Result};
pub use events::{BufferingListener, DispatchThread, ErrorListener, EventContext, Notifier};
pub use net::StreamUrl;
pub use power::NoKeepAwake;
pub use session::StreamState;
pub use settings::Settings;
