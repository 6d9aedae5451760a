// src/audio/waveform.rs

use serde::{Deserialize, Serialize};

use crate::audio::types::PcmBuffer;
use crate::error::{AudioError, Result};

/// Peak count used when the caller does not ask for one
pub const DEFAULT_NUM_PEAKS: usize = 2000;

/// Min/max amplitude per display segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformPeaks {
    /// Lowest sample across all channels in each segment
    pub min_peaks: Vec<f32>,

    /// Highest sample across all channels in each segment
    pub max_peaks: Vec<f32>,

    pub num_peaks: usize,
    pub duration_seconds: f64,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Extract waveform peaks from a buffer for visualization
///
/// Splits the buffer into `num_peaks` equal segments and records the
/// min/max sample of each across every channel. Segments with no frames
/// (more peaks than frames) report 0.0.
///
/// # Example
/// ```
/// use audiocut::audio::{extract_waveform_peaks, PcmBuffer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = PcmBuffer::silence(44100, 2, 44100)?;
/// let peaks = extract_waveform_peaks(&audio, Some(100))?;
/// assert_eq!(peaks.min_peaks.len(), 100);
/// # Ok(())
/// # }
/// ```
pub fn extract_waveform_peaks(audio: &PcmBuffer, num_peaks: Option<usize>) -> Result<WaveformPeaks> {
    let num_peaks = num_peaks.unwrap_or(DEFAULT_NUM_PEAKS);

    if num_peaks == 0 {
        return Err(AudioError::InvalidArgument(
            "num_peaks must be greater than 0".to_string(),
        ));
    }

    let mut min_peaks = vec![f32::MAX; num_peaks];
    let mut max_peaks = vec![f32::MIN; num_peaks];

    // Calculate how many frames belong to each peak segment
    let frames_per_peak = audio.frame_count() as f64 / num_peaks as f64;
    let channels: Vec<&[f32]> = audio.channels().collect();

    for frame_idx in 0..audio.frame_count() {
        let peak_idx = ((frame_idx as f64 / frames_per_peak) as usize).min(num_peaks - 1);

        let (frame_min, frame_max) = channels.iter().fold((f32::MAX, f32::MIN), |(lo, hi), c| {
            let sample = c[frame_idx];
            (lo.min(sample), hi.max(sample))
        });

        min_peaks[peak_idx] = min_peaks[peak_idx].min(frame_min);
        max_peaks[peak_idx] = max_peaks[peak_idx].max(frame_max);
    }

    // Segments that received no frames
    for (min, max) in min_peaks.iter_mut().zip(max_peaks.iter_mut()) {
        if *min == f32::MAX {
            *min = 0.0;
        }
        if *max == f32::MIN {
            *max = 0.0;
        }
    }

    Ok(WaveformPeaks {
        min_peaks,
        max_peaks,
        num_peaks,
        duration_seconds: audio.duration_seconds(),
        channels: audio.channel_count() as u16,
        sample_rate: audio.sample_rate(),
    })
}
