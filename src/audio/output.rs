//! cpal-backed audio output
//!
//! Bridges the playback worker's blocking `write` calls to the cpal callback
//! through a lock-free ring buffer: the worker pushes interleaved f32 samples,
//! the device callback pops them and substitutes silence on underrun.

use crate::audio::{AudioSink, AudioSpec};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// Ring depth between the playback worker and the device callback, in
/// seconds of audio.
const DEVICE_RING_SECONDS: f32 = 0.5;

/// How long `write` parks when the device ring is full.
const PUSH_RETRY_INTERVAL: Duration = Duration::from_millis(10);

struct OpenStream {
    spec: AudioSpec,
    producer: HeapProd<f32>,
    failed: Arc<AtomicBool>,
    /// Kept alive for playback; never accessed after creation.
    _stream: Stream,
}

/// Audio sink writing to the host's output device via cpal.
pub struct CpalSink {
    device_name: Option<String>,
    open: Option<OpenStream>,
}

// SAFETY: CpalSink can be sent between threads because the cpal Stream is
// created on the playback thread, never accessed after creation, and only
// kept alive until stop/drop; the device callback owns its own consumer end
// of the ring buffer.
unsafe impl Send for CpalSink {}

impl CpalSink {
    /// Sink on the default output device.
    pub fn new() -> Self {
        Self {
            device_name: None,
            open: None,
        }
    }

    /// Sink on a named output device.
    pub fn with_device(device_name: String) -> Self {
        Self {
            device_name: Some(device_name),
            open: None,
        }
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| Error::Resource(format!("Failed to enumerate devices: {}", e)))?;
                devices
                    .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                    .ok_or_else(|| Error::Resource(format!("Audio device not found: {}", name)))
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::Resource("No audio output device available".to_string())),
        }
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CpalSink {
    fn configure(&mut self, spec: AudioSpec) -> Result<()> {
        // Tear down any previous stream before opening the new format.
        self.open = None;

        let device = self.find_device()?;
        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            rate = spec.sample_rate,
            channels = spec.channels,
            "Opening audio output"
        );

        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Resource(format!("Failed to query device configs: {}", e)))?
            .find(|c| {
                c.sample_format() == cpal::SampleFormat::F32
                    && c.channels() == spec.channels
                    && c.min_sample_rate().0 <= spec.sample_rate
                    && c.max_sample_rate().0 >= spec.sample_rate
            })
            .ok_or_else(|| {
                Error::Resource(format!(
                    "Device does not support {} Hz / {} channel f32 output",
                    spec.sample_rate, spec.channels
                ))
            })?
            .with_sample_rate(cpal::SampleRate(spec.sample_rate));

        let ring_len =
            (spec.sample_rate as f32 * spec.channels as f32 * DEVICE_RING_SECONDS) as usize;
        let (producer, mut consumer) = HeapRb::<f32>::new(ring_len.max(1024)).split();

        let failed = Arc::new(AtomicBool::new(false));
        let failed_clone = Arc::clone(&failed);

        let config: cpal::StreamConfig = supported.into();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let n = consumer.pop_slice(data);
                    // Underrun: pad with silence rather than stale samples.
                    for sample in &mut data[n..] {
                        *sample = 0.0;
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    failed_clone.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::Resource(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Resource(format!("Failed to start output stream: {}", e)))?;

        self.open = Some(OpenStream {
            spec,
            producer,
            failed,
            _stream: stream,
        });
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| Error::Resource("Audio output not configured".to_string()))?;

        let mut written = 0;
        while written < samples.len() {
            if open.failed.load(Ordering::Acquire) {
                return Err(Error::Resource("Audio output stream failed".to_string()));
            }
            let n = open.producer.push_slice(&samples[written..]);
            written += n;
            if n == 0 {
                // Device ring full; the callback drains it in real time.
                thread::sleep(PUSH_RETRY_INTERVAL);
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(rate = open.spec.sample_rate, "Closing audio output");
            // Dropping the stream stops the callback.
        }
    }
}
