use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// Decoded audio held in memory as planar PCM samples
///
/// Each channel is its own vector of 32-bit floats, nominally in the range
/// [-1.0, 1.0]. Values outside that range are kept as-is and only clamped
/// when the buffer is encoded.
///
/// A `PcmBuffer` never changes after construction: trimming produces a new
/// buffer, which is what lets undo/redo keep old buffers around safely.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    frame_count: usize,
}

impl PcmBuffer {
    /// Build a buffer from one sample vector per channel
    ///
    /// Every channel must have the same length, and there must be between
    /// 1 and `u16::MAX` channels (the WAV header stores the count as u16).
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidBuffer(
                "sample rate must be greater than 0".to_string(),
            ));
        }

        if channels.is_empty() {
            return Err(AudioError::InvalidBuffer(
                "buffer must have at least one channel".to_string(),
            ));
        }

        if channels.len() > u16::MAX as usize {
            return Err(AudioError::InvalidBuffer(format!(
                "too many channels: {}",
                channels.len()
            )));
        }

        let frame_count = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frame_count)
        {
            return Err(AudioError::InvalidBuffer(format!(
                "channel {} has {} frames, expected {}",
                index,
                channel.len(),
                frame_count
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            frame_count,
        })
    }

    /// Build a buffer by splitting interleaved samples into channels
    ///
    /// For stereo: [L0, R0, L1, R1, ...]. A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, samples: &[f32]) -> Result<Self> {
        if channel_count == 0 {
            return Err(AudioError::InvalidBuffer(
                "buffer must have at least one channel".to_string(),
            ));
        }

        let channel_count = channel_count as usize;
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];

        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// A buffer of `frame_count` zero samples on every channel
    pub fn silence(sample_rate: u32, channel_count: u16, frame_count: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; frame_count]; channel_count as usize])
    }

    /// A new buffer with this buffer's sample rate and the given channels
    ///
    /// Callers pass the same number of equal-length channels as `self`.
    pub(crate) fn derive(&self, channels: Vec<Vec<f32>>) -> Self {
        debug_assert_eq!(channels.len(), self.channels.len());
        let frame_count = channels.first().map_or(0, Vec::len);
        debug_assert!(channels.iter().all(|c| c.len() == frame_count));

        Self {
            sample_rate: self.sample_rate,
            channels,
            frame_count,
        }
    }

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Calculate the total duration of the audio in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Sample `index` of `channel`, or `None` when either is out of range
    pub fn sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.channels.get(channel)?.get(index).copied()
    }

    /// All samples of one channel
    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Iterate over the channels in order
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Summary suitable for display or JSON output
    pub fn info(&self) -> AudioInfo {
        AudioInfo {
            duration_seconds: self.duration_seconds(),
            sample_rate: self.sample_rate,
            channels: self.channel_count() as u16,
            frame_count: self.frame_count,
        }
    }
}

/// Metadata about a loaded buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Total duration in seconds
    pub duration_seconds: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Frames per channel
    pub frame_count: usize,
}

/// A time range for trimming, in seconds
///
/// Values come straight from user input, so construction never fails:
/// NaN and negative times are treated as 0. Ranges that end before they
/// start, or that run past the audio, are resolved when converted to
/// sample indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    /// Start time in seconds (>= 0)
    pub start_seconds: f64,

    /// End time in seconds (>= 0)
    pub end_seconds: f64,
}

impl TrimRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds: sanitize_seconds(start_seconds),
            end_seconds: sanitize_seconds(end_seconds),
        }
    }

    /// The range selecting every frame of `audio`
    ///
    /// `frame_count / sample_rate` does not always floor back to
    /// `frame_count`, so the end is nudged up to the smallest time that does.
    pub fn covering(audio: &PcmBuffer) -> Self {
        let rate = audio.sample_rate() as f64;
        let frames = audio.frame_count() as f64;

        let mut end = audio.duration_seconds();
        while (end * rate).floor() < frames {
            // next representable f64 above a positive finite value
            end = f64::from_bits(end.to_bits() + 1);
        }

        Self {
            start_seconds: 0.0,
            end_seconds: end,
        }
    }

    /// Get the requested duration, 0 for inverted ranges
    pub fn trim_duration(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0.0)
    }

    /// Convert to a half-open `[start, end)` frame range within `frame_count`
    ///
    /// Both bounds are `floor(seconds * sample_rate)` clamped to
    /// `[0, frame_count]`, and `end >= start` always holds. The fields are
    /// public and deserializable, so they are sanitized again here.
    pub fn frame_bounds(&self, sample_rate: u32, frame_count: usize) -> (usize, usize) {
        let start = sanitize_seconds(self.start_seconds);
        let end = sanitize_seconds(self.end_seconds);

        let start = seconds_to_frame(start, sample_rate, frame_count);
        let end = seconds_to_frame(end, sample_rate, frame_count);
        (start, end.max(start))
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds < 0.0 {
        0.0
    } else {
        seconds
    }
}

fn seconds_to_frame(seconds: f64, sample_rate: u32, frame_count: usize) -> usize {
    let frame = (seconds * sample_rate as f64).floor();
    if frame >= frame_count as f64 {
        frame_count
    } else {
        // sanitized seconds: not NaN, >= 0, and +inf took the branch above
        frame as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_channels() {
        let result = PcmBuffer::new(44100, vec![vec![0.0; 10], vec![0.0; 9]]);
        assert!(matches!(result, Err(AudioError::InvalidBuffer(_))));
    }

    #[test]
    fn test_new_rejects_zero_rate_and_no_channels() {
        assert!(PcmBuffer::new(0, vec![vec![0.0; 4]]).is_err());
        assert!(PcmBuffer::new(44100, Vec::new()).is_err());
    }

    #[test]
    fn test_from_interleaved_splits_channels() {
        let buffer = PcmBuffer::from_interleaved(8000, 2, &[0.1, -0.1, 0.2, -0.2, 0.3]).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn test_sample_access_out_of_range() {
        let buffer = PcmBuffer::silence(44100, 2, 100).unwrap();

        assert_eq!(buffer.sample(1, 99), Some(0.0));
        assert_eq!(buffer.sample(2, 0), None);
        assert_eq!(buffer.sample(0, 100), None);
    }

    #[test]
    fn test_duration() {
        let buffer = PcmBuffer::silence(44100, 2, 88200).unwrap();
        assert_eq!(buffer.duration_seconds(), 2.0);
        assert_eq!(buffer.info().frame_count, 88200);
    }

    #[test]
    fn test_trim_range_sanitizes_input() {
        let range = TrimRange::new(f64::NAN, -3.0);
        assert_eq!(range.start_seconds, 0.0);
        assert_eq!(range.end_seconds, 0.0);
    }

    #[test]
    fn test_frame_bounds_clamp_and_order() {
        // inverted range collapses to an empty span
        assert_eq!(TrimRange::new(1.5, 0.5).frame_bounds(100, 200), (150, 150));
        // end past the buffer clamps
        assert_eq!(TrimRange::new(0.0, 100.0).frame_bounds(100, 200), (0, 200));
        assert_eq!(TrimRange::new(0.0, f64::INFINITY).frame_bounds(100, 200), (0, 200));
        // floor, not round
        assert_eq!(TrimRange::new(0.019, 0.999).frame_bounds(100, 200), (1, 99));
    }

    #[test]
    fn test_frame_bounds_sanitize_raw_fields() {
        let raw = TrimRange {
            start_seconds: f64::NAN,
            end_seconds: f64::NEG_INFINITY,
        };
        assert_eq!(raw.frame_bounds(100, 200), (0, 0));

        let raw = TrimRange {
            start_seconds: -5.0,
            end_seconds: 1.0,
        };
        assert_eq!(raw.frame_bounds(100, 200), (0, 100));

        let parsed: TrimRange =
            serde_json::from_str(r#"{ "start_seconds": -2.5, "end_seconds": 0.5 }"#).unwrap();
        assert_eq!(parsed.frame_bounds(100, 200), (0, 50));
    }

    #[test]
    fn test_covering_selects_every_frame() {
        // 15 / 44100 * 44100 floors to 14 without the nudge
        let audio = PcmBuffer::silence(44100, 2, 15).unwrap();
        let range = TrimRange::covering(&audio);
        assert_eq!(range.start_seconds, 0.0);
        assert_eq!(range.frame_bounds(44100, 15), (0, 15));

        for (rate, frames) in [(48000, 27), (22050, 15), (44100, 88200), (8000, 0)] {
            let audio = PcmBuffer::silence(rate, 1, frames).unwrap();
            let range = TrimRange::covering(&audio);
            assert_eq!(range.frame_bounds(rate, frames), (0, frames));
            assert!((range.end_seconds - audio.duration_seconds()).abs() < 1e-9);
        }
    }
}
