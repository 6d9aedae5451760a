// src/audio/mod.rs

pub mod decoder;
pub mod encoder;
#[cfg(feature = "playback")]
pub mod playback;
pub mod trim;
pub mod types;
pub mod waveform;

// Re-export commonly used items
pub use decoder::{AudioDecoder, SymphoniaDecoder};
pub use encoder::{encode_wav, encode_wav_window, sample_to_i16, write_wav_file, WAV_MIME_TYPE};
#[cfg(feature = "playback")]
pub use playback::AudioPlayer;
pub use trim::trim_buffer;
pub use types::{AudioInfo, PcmBuffer, TrimRange};
pub use waveform::{extract_waveform_peaks, WaveformPeaks};
