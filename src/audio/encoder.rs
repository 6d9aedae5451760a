// src/audio/encoder.rs

use std::path::Path;

use crate::audio::types::PcmBuffer;
use crate::error::Result;

/// MIME type of the encoder output
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Size of the canonical RIFF/WAVE header written before the sample data
pub const WAV_HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: usize = 2;
const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Encode a whole buffer as a 16-bit PCM WAV byte stream
///
/// The output is always `44 + frames * channels * 2` bytes: a canonical
/// header with a single `fmt ` and a single `data` chunk, followed by
/// interleaved little-endian samples.
///
/// # Example
/// ```
/// use audiocut::audio::{encode_wav, PcmBuffer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = PcmBuffer::new(44100, vec![vec![0.0, 0.5, -0.5, 1.0, -1.0]])?;
///
/// let bytes = encode_wav(&audio);
///
/// assert_eq!(&bytes[0..4], b"RIFF");
/// assert_eq!(bytes.len(), 44 + 5 * 2);
/// # Ok(())
/// # }
/// ```
pub fn encode_wav(audio: &PcmBuffer) -> Vec<u8> {
    encode_wav_window(audio, 0, audio.frame_count())
}

/// Encode `length` frames starting at frame `offset`
///
/// The window is clamped to the buffer, so an oversized window encodes
/// whatever frames exist and a window past the end encodes a header only.
pub fn encode_wav_window(audio: &PcmBuffer, offset: usize, length: usize) -> Vec<u8> {
    let start = offset.min(audio.frame_count());
    let end = start.saturating_add(length).min(audio.frame_count());
    let frames = end - start;

    let channel_count = audio.channel_count();
    let data_len = frames * channel_count * BYTES_PER_SAMPLE;
    let total_len = data_len + WAV_HEADER_LEN;

    let mut bytes = Vec::with_capacity(total_len);
    write_header(&mut bytes, audio.sample_rate(), channel_count as u16, data_len);

    let channels: Vec<&[f32]> = audio.channels().collect();
    for frame in start..end {
        for channel in &channels {
            bytes.extend_from_slice(&sample_to_i16(channel[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(bytes.len(), total_len);
    bytes
}

/// Encode a buffer and write it to `output_path`
///
/// # Example
/// ```
/// use audiocut::audio::{write_wav_file, PcmBuffer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = PcmBuffer::silence(8000, 1, 800)?;
///
/// # let output_path = std::env::temp_dir().join("audiocut_doc_output.wav");
/// write_wav_file(&audio, &output_path)?;
/// # std::fs::remove_file(&output_path).ok();
/// # Ok(())
/// # }
/// ```
pub fn write_wav_file<P: AsRef<Path>>(audio: &PcmBuffer, output_path: P) -> Result<()> {
    std::fs::write(output_path, encode_wav(audio))?;
    Ok(())
}

/// Convert a float sample to 16-bit PCM
///
/// Clamps to [-1.0, 1.0], then scales negatives by 32768 and everything
/// else by 32767 so both ends of the i16 range are reachable. The cast
/// truncates toward zero; NaN becomes 0.
pub fn sample_to_i16(sample: f32) -> i16 {
    let sample = (sample as f64).clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32768.0) as i16
    } else {
        (sample * 32767.0) as i16
    }
}

fn write_header(bytes: &mut Vec<u8>, sample_rate: u32, channels: u16, data_len: usize) {
    // Sizes beyond u32 cannot be represented in a RIFF header
    let data_len = u32::try_from(data_len).unwrap_or(u32::MAX);
    let riff_len = data_len.saturating_add(WAV_HEADER_LEN as u32 - 8);
    let block_align = channels.wrapping_mul(BYTES_PER_SAMPLE as u16);
    let byte_rate = sample_rate.wrapping_mul(block_align as u32);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&riff_len.to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
}
