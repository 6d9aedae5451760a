// src/audio/decoder.rs

use hound::{SampleFormat, WavReader};
use std::io::{Cursor, ErrorKind};
use symphonia::core::audio::AudioBufferRef;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::types::PcmBuffer;
use crate::error::{AudioError, Result};

/// A service that turns raw file bytes into decoded PCM
///
/// The engine holds one of these instead of reaching for a global decoder,
/// so tests can substitute a fake.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer>;

    /// Decode with the source's file extension (e.g., "mp3") as a format hint
    fn decode_with_hint(&self, bytes: &[u8], _extension: Option<&str>) -> Result<PcmBuffer> {
        self.decode(bytes)
    }
}

/// Decodes WAV with hound and everything else with symphonia
///
/// Supports: MP3, FLAC, WAV, OGG Vorbis, AAC, and more
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Help format detection with the file extension (e.g., "mp3")
    pub fn with_extension_hint(extension: impl Into<String>) -> Self {
        Self {
            extension_hint: Some(extension.into()),
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    /// # Example
    /// ```
    /// use audiocut::audio::{encode_wav, AudioDecoder, PcmBuffer, SymphoniaDecoder};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let original = PcmBuffer::silence(44100, 2, 4410)?;
    /// let audio = SymphoniaDecoder::new().decode(&encode_wav(&original))?;
    ///
    /// assert_eq!(audio.sample_rate(), 44100);
    /// assert_eq!(audio.channel_count(), 2);
    /// assert_eq!(audio.frame_count(), 4410);
    /// # Ok(())
    /// # }
    /// ```
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer> {
        self.decode_with_hint(bytes, None)
    }

    /// A per-call `extension` takes precedence over the decoder's own hint
    fn decode_with_hint(&self, bytes: &[u8], extension: Option<&str>) -> Result<PcmBuffer> {
        if is_wav(bytes) {
            match decode_wav(bytes) {
                Ok(audio) => return Ok(audio),
                Err(e) => {
                    tracing::debug!("hound rejected WAV input, falling back to symphonia: {}", e);
                }
            }
        }

        let hint = extension.or(self.extension_hint.as_deref());
        decode_with_symphonia(bytes, hint)
    }
}

/// Check for a RIFF/WAVE signature
fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode a WAV file directly with hound (fast path, no probing)
pub(crate) fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedFormat(format!(
                    "Unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }

            // Convert signed integers to f32 in range [-1.0, 1.0]
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()?
        }
    };

    PcmBuffer::from_interleaved(spec.sample_rate, spec.channels, &samples)
}

/// Decode any container/codec symphonia knows into planar PCM
fn decode_with_symphonia(bytes: &[u8], extension_hint: Option<&str>) -> Result<PcmBuffer> {
    // Create a media source stream (buffered reader) over an owned copy
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint {
        hint.with_extension(extension);
    }

    // Probe the media source to detect format
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    // Find the default audio track (skip video/subtitle tracks)
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed("No audio track found in file".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::DecodeFailed("Sample rate not found".to_string()))?;

    // Channels may be missing from metadata for some MP3s; the first decoded
    // packet settles it in that case
    let mut channels: Option<Vec<Vec<f32>>> = track
        .codec_params
        .channels
        .map(|c| vec![Vec::new(); c.count()]);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeFailed(format!("Failed to create decoder: {}", e)))?;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(AudioError::DecodeFailed(format!("Failed to read packet: {}", e))),
        };

        // Skip packets from other tracks (e.g., video, album art)
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(AudioError::DecodeFailed(format!("Decode error: {}", e))),
        };

        let output = channels.get_or_insert_with(|| vec![Vec::new(); decoded.spec().channels.count()]);
        append_planes(&decoded, output);
    }

    let channels = channels
        .ok_or_else(|| AudioError::DecodeFailed("Could not determine channel count".to_string()))?;

    tracing::debug!(
        sample_rate,
        channels = channels.len(),
        frames = channels.first().map_or(0, Vec::len),
        "Decoded audio with symphonia"
    );

    PcmBuffer::new(sample_rate, channels)
}

/// Append one decoded packet to the per-channel output
///
/// Handles all sample formats (u8, i16, i24, i32, f32, f64) and converts to f32
fn append_planes(buffer: &AudioBufferRef, output: &mut [Vec<f32>]) {
    match buffer {
        AudioBufferRef::F32(buf) => extend_planes(buf.planes().planes(), output, |&s| s),
        AudioBufferRef::F64(buf) => extend_planes(buf.planes().planes(), output, |&s| s as f32),

        // Convert signed integers to f32 in range [-1.0, 1.0]
        AudioBufferRef::S8(buf) => {
            extend_planes(buf.planes().planes(), output, |&s| s as f32 / 128.0)
        }
        AudioBufferRef::S16(buf) => {
            extend_planes(buf.planes().planes(), output, |&s| s as f32 / 32768.0)
        }
        AudioBufferRef::S24(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            s.inner() as f32 / 8388608.0
        }),
        AudioBufferRef::S32(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            s as f32 / 2147483648.0
        }),

        // Convert unsigned integers to f32
        AudioBufferRef::U8(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            (s as f32 - 128.0) / 128.0
        }),
        AudioBufferRef::U16(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            (s as f32 - 32768.0) / 32768.0
        }),
        AudioBufferRef::U24(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            (s.inner() as f32 - 8388608.0) / 8388608.0
        }),
        AudioBufferRef::U32(buf) => extend_planes(buf.planes().planes(), output, |&s| {
            (s as f64 - 2147483648.0) as f32 / 2147483648.0
        }),
    }
}

fn extend_planes<T, F>(planes: &[&[T]], output: &mut [Vec<f32>], convert: F)
where
    F: Fn(&T) -> f32,
{
    for (plane, channel) in planes.iter().zip(output.iter_mut()) {
        channel.extend(plane.iter().map(&convert));
    }
}
