//! Error types for shoutstream
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Every streaming failure is local to one worker thread; each worker maps its
//! failure into a single fatal-error notification and terminates. There is no
//! retry at this layer.

use thiserror::Error;

/// Main error type for shoutstream
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open the TCP connection to the streaming host
    #[error("Connect error: {0}")]
    Connect(String),

    /// Failed to send the HTTP request line
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Mid-stream socket failure (including end-of-stream)
    #[error("Read error: {0}")]
    Read(String),

    /// External decoder failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// Keep-awake or audio-sink acquisition failure
    #[error("Resource error: {0}")]
    Resource(String),

    /// Malformed or unsupported stream URL
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Invalid state for operation (e.g. start while a session is live)
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using shoutstream Error
pub type Result<T> = std::result::Result<T, Error>;
