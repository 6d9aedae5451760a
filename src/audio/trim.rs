// src/audio/trim.rs

use crate::audio::types::{PcmBuffer, TrimRange};

/// Trim audio to a specific time range
///
/// Copies frames `[floor(start * rate), floor(end * rate))` of every channel
/// into a new buffer. The bounds are clamped to the buffer, and a range that
/// ends at or before its start yields a zero-frame buffer instead of an error.
///
/// # Example
/// ```
/// use audiocut::audio::{trim_buffer, PcmBuffer, TrimRange};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // 10 seconds of stereo at 44.1kHz
/// let original = PcmBuffer::silence(44100, 2, 441000)?;
///
/// let trimmed = trim_buffer(&original, &TrimRange::new(5.0, 10.0));
///
/// assert_eq!(trimmed.duration_seconds(), 5.0);
/// assert_eq!(trimmed.sample_rate(), 44100);
/// assert_eq!(trimmed.channel_count(), 2);
/// # Ok(())
/// # }
/// ```
pub fn trim_buffer(audio: &PcmBuffer, range: &TrimRange) -> PcmBuffer {
    let (start_frame, end_frame) = range.frame_bounds(audio.sample_rate(), audio.frame_count());

    let channels: Vec<Vec<f32>> = audio
        .channels()
        .map(|channel| channel[start_frame..end_frame].to_vec())
        .collect();

    tracing::debug!(
        start_frame,
        end_frame,
        frames = end_frame - start_frame,
        "Trimmed buffer"
    );

    audio.derive(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a ramp so copied positions can be checked
    fn create_test_audio(duration_seconds: f64, sample_rate: u32, channels: u16) -> PcmBuffer {
        let frames = (duration_seconds * sample_rate as f64) as usize;
        let data = (0..channels)
            .map(|c| {
                (0..frames)
                    .map(|i| (i as f32 / frames as f32) * if c % 2 == 0 { 1.0 } else { -1.0 })
                    .collect()
            })
            .collect();
        PcmBuffer::new(sample_rate, data).unwrap()
    }

    #[test]
    fn test_trim_middle_section() {
        let audio = create_test_audio(10.0, 44100, 2);

        let trimmed = trim_buffer(&audio, &TrimRange::new(3.0, 7.0));

        assert_eq!(trimmed.duration_seconds(), 4.0);
        assert_eq!(trimmed.sample(0, 0), audio.sample(0, 3 * 44100));
        assert_eq!(trimmed.sample(1, 0), audio.sample(1, 3 * 44100));
        assert_eq!(
            trimmed.sample(0, trimmed.frame_count() - 1),
            audio.sample(0, 7 * 44100 - 1)
        );
    }

    #[test]
    fn test_trim_start() {
        let audio = create_test_audio(10.0, 44100, 2);

        let trimmed = trim_buffer(&audio, &TrimRange::new(0.0, 5.0));

        assert_eq!(trimmed.duration_seconds(), 5.0);
    }

    #[test]
    fn test_trim_frame_count_uses_floor() {
        let audio = create_test_audio(1.0, 1000, 1);

        // floor(0.8509 * 1000) - floor(0.1234 * 1000) = 850 - 123
        let trimmed = trim_buffer(&audio, &TrimRange::new(0.1234, 0.8509));

        assert_eq!(trimmed.frame_count(), 727);
        assert_eq!(trimmed.sample(0, 0), audio.sample(0, 123));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let audio = create_test_audio(2.0, 44100, 2);

        let trimmed = trim_buffer(&audio, &TrimRange::new(1.5, 0.5));

        assert_eq!(trimmed.frame_count(), 0);
        assert_eq!(trimmed.channel_count(), 2);
        assert_eq!(trimmed.sample_rate(), 44100);
        assert!(trimmed.channels().all(|c| c.is_empty()));
    }

    #[test]
    fn test_equal_bounds_are_empty() {
        let audio = create_test_audio(2.0, 44100, 1);
        assert!(trim_buffer(&audio, &TrimRange::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_out_of_bounds_clamps_to_full_buffer() {
        let audio = create_test_audio(2.0, 44100, 2);

        let trimmed = trim_buffer(&audio, &TrimRange::new(-1.0, 100.0));

        assert_eq!(trimmed, audio);
    }

    #[test]
    fn test_nan_start_reads_from_zero() {
        let audio = create_test_audio(2.0, 100, 1);

        let trimmed = trim_buffer(&audio, &TrimRange::new(f64::NAN, 0.5));

        assert_eq!(trimmed.frame_count(), 50);
        assert_eq!(trimmed.sample(0, 0), audio.sample(0, 0));
    }

    #[test]
    fn test_range_entirely_past_end_is_empty() {
        let audio = create_test_audio(2.0, 100, 2);
        assert!(trim_buffer(&audio, &TrimRange::new(5.0, 9.0)).is_empty());
    }

    #[test]
    fn test_source_is_untouched() {
        let audio = create_test_audio(1.0, 100, 2);
        let before = audio.clone();

        let _ = trim_buffer(&audio, &TrimRange::new(0.2, 0.4));

        assert_eq!(audio, before);
    }
}
