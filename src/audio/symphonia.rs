//! Symphonia-backed stream decoder
//!
//! Decodes the compressed bitstream (MP3, AAC, Vorbis) to interleaved f32 PCM.
//! The source is a live, non-seekable byte stream: probing scans forward for a
//! sync point, which also skips the HTTP response header bytes the transport
//! passes through untouched.

use crate::audio::{AudioSpec, Decoder, DecoderFactory, PcmBlock};
use crate::error::{Error, Result};
use std::io::Read;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Opens [`SymphoniaDecoder`]s over live byte streams.
#[derive(Debug, Default)]
pub struct SymphoniaDecoderFactory;

impl SymphoniaDecoderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl DecoderFactory for SymphoniaDecoderFactory {
    fn open(&self, source: Box<dyn Read + Send + Sync>) -> Result<Box<dyn Decoder>> {
        // ReadOnlySource marks the stream non-seekable, so the probe commits
        // to forward scanning only.
        let mss = MediaSourceStream::new(
            Box::new(ReadOnlySource::new(source)),
            Default::default(),
        );

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to identify stream format: {}", e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        debug!(track_id, "Opened stream decoder");
        Ok(Box::new(SymphoniaDecoder {
            format,
            decoder,
            track_id,
        }))
    }
}

/// One live decode session over a probed stream.
pub struct SymphoniaDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
}

impl Decoder for SymphoniaDecoder {
    fn next_block(&mut self) -> Result<Option<PcmBlock>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Error reading packet: {}", e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count() as u16;
                    let mut samples = Vec::new();
                    convert_samples_to_f32(&decoded, &mut samples);
                    if samples.is_empty() {
                        continue;
                    }
                    return Ok(Some(PcmBlock {
                        spec: AudioSpec {
                            sample_rate: spec.rate,
                            // Mono is duplicated to stereo during conversion.
                            channels: if channels == 1 { 2 } else { channels },
                        },
                        samples,
                    }));
                }
                Err(symphonia::core::errors::Error::DecodeError(e)) => {
                    // Corrupt frames happen on live radio; skip and resync.
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decoder failed: {}", e)));
                }
            }
        }
    }
}

/// Convert a symphonia audio buffer to interleaved f32 samples.
///
/// Normalizes integer formats to [-1.0, 1.0] and duplicates mono to stereo.
fn convert_samples_to_f32(decoded: &AudioBufferRef, output: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => interleave(buf, output, |s| s),
        AudioBufferRef::F64(buf) => interleave(buf, output, |s| s as f32),
        AudioBufferRef::S32(buf) => interleave(buf, output, |s| s as f32 / i32::MAX as f32),
        AudioBufferRef::S16(buf) => interleave(buf, output, |s| s as f32 / i16::MAX as f32),
        AudioBufferRef::S8(buf) => interleave(buf, output, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::U16(buf) => {
            interleave(buf, output, |s| ((s as i32) - 32768) as f32 / 32768.0)
        }
        AudioBufferRef::U8(buf) => {
            interleave(buf, output, |s| ((s as i32) - 128) as f32 / 128.0)
        }
        AudioBufferRef::S24(buf) => {
            interleave(buf, output, |s| s.inner() as f32 / 8388608.0)
        }
        AudioBufferRef::U24(buf) => interleave(buf, output, |s| {
            ((s.inner() as i32) - 8388608) as f32 / 8388608.0
        }),
        AudioBufferRef::U32(buf) => {
            interleave(buf, output, |s| (s as i32) as f32 / i32::MAX as f32)
        }
    }
}

fn interleave<S, F>(
    buf: &symphonia::core::audio::AudioBuffer<S>,
    output: &mut Vec<f32>,
    convert: F,
) where
    S: symphonia::core::sample::Sample + Copy,
    F: Fn(S) -> f32,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    output.reserve(num_frames * num_channels.max(2));

    if num_channels == 1 {
        // Duplicate mono to stereo so downstream only sees >= 2 channels.
        for frame_idx in 0..num_frames {
            let sample = convert(buf.chan(0)[frame_idx]);
            output.push(sample);
            output.push(sample);
        }
    } else {
        for frame_idx in 0..num_frames {
            for ch_idx in 0..num_channels {
                output.push(convert(buf.chan(ch_idx)[frame_idx]));
            }
        }
    }
}
