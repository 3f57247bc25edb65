//! Tunable streaming parameters
//!
//! Every field has a workable default; tests shorten the poll interval
//! rather than asserting on the 200 ms figure.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_bytes_per_kbps() -> usize {
    // Determined experimentally: half a second of compressed audio per kbps step.
    512
}

fn default_threshold_percent() -> u32 {
    75
}

fn default_read_chunk_bytes() -> usize {
    4096
}

/// Streaming configuration.
///
/// Deserializable from TOML so the demo binary can load overrides from a
/// config file; every field falls back to its default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Fixed backpressure/threshold polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Buffer sizing scale: bytes of buffer per kbps of (clamped) bitrate
    #[serde(default = "default_bytes_per_kbps")]
    pub bytes_per_kbps: usize,

    /// Fill percentage at which playback is allowed to begin
    #[serde(default = "default_threshold_percent")]
    pub buffering_threshold_percent: u32,

    /// Scratch chunk size for socket reads
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            bytes_per_kbps: default_bytes_per_kbps(),
            buffering_threshold_percent: default_threshold_percent(),
            read_chunk_bytes: default_read_chunk_bytes(),
        }
    }
}

impl Settings {
    /// Polling interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Buffer size (in bytes) for this bitrate (in kilobits per second).
    ///
    /// The bitrate is clamped to [64, 320] kbps, so the result scales
    /// monotonically inside that range and is flat outside it.
    pub fn buffer_capacity_for_bitrate(&self, bitrate_kbps: u32) -> usize {
        bitrate_kbps.clamp(64, 320) as usize * self.bytes_per_kbps
    }

    /// Fill level (in bytes) that gates the buffering-to-playing transition.
    pub fn buffering_threshold(&self, capacity: usize) -> usize {
        capacity * self.buffering_threshold_percent as usize / 100
    }
}
