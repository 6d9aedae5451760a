// src/preview.rs
//! Preview collaborators fed with the current audio after every edit
//!
//! The engine hands each new buffer to the attached sink as WAV bytes, the
//! same stream a download would produce. A sink is a scoped resource: the
//! slot releases the previous sink before installing another, and releases
//! whatever it holds when it is dropped.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use tokio::sync::watch;

use crate::audio::types::PcmBuffer;
use crate::audio::waveform::{extract_waveform_peaks, WaveformPeaks};
use crate::error::{AudioError, Result};

/// Something that renders or plays the current audio
pub trait PreviewSink: Send {
    /// Replace whatever is being previewed with this WAV stream
    fn load(&mut self, wav: &[u8]) -> Result<()>;

    /// The source was removed; show nothing
    fn clear(&mut self) {}

    /// Tear down any live resources. Called once, before the sink is dropped
    fn release(&mut self) {}
}

/// Holds at most one preview sink
#[derive(Default)]
pub struct PreviewSlot {
    sink: Option<Box<dyn PreviewSink>>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `sink`, releasing any previous one first
    pub fn acquire(&mut self, sink: Box<dyn PreviewSink>) {
        self.release();
        self.sink = Some(sink);
    }

    /// Release and drop the current sink, if any
    pub fn release(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.release();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Send a WAV stream to the sink. Failures are logged, never returned
    pub fn publish(&mut self, wav: &[u8]) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.load(wav) {
                tracing::warn!("Preview failed to load audio: {}", e);
            }
        }
    }

    pub fn clear(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.clear();
        }
    }
}

impl Drop for PreviewSlot {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PreviewSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Read a WAV stream back into a buffer
///
/// Used by preview sinks, which receive the encoder's 16-bit output.
pub fn read_wav_stream(wav: &[u8]) -> Result<PcmBuffer> {
    let mut reader = WavReader::new(Cursor::new(wav))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AudioError::UnsupportedFormat(format!(
            "preview expects 16-bit PCM, got {} bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|s| s as f32 / 32768.0))
        .collect::<std::result::Result<Vec<f32>, _>>()?;

    PcmBuffer::from_interleaved(spec.sample_rate, spec.channels, &samples)
}

/// Waveform view: turns each previewed stream into min/max peaks
///
/// Subscribers get the latest peaks through a watch channel; `None` means
/// nothing is loaded.
pub struct WaveformPreview {
    num_peaks: usize,
    peaks: watch::Sender<Option<WaveformPeaks>>,
}

impl WaveformPreview {
    pub fn new(num_peaks: usize) -> Self {
        let (peaks, _) = watch::channel(None);
        Self { num_peaks, peaks }
    }

    /// Receiver that always sees the most recent peaks
    pub fn subscribe(&self) -> watch::Receiver<Option<WaveformPeaks>> {
        self.peaks.subscribe()
    }
}

impl PreviewSink for WaveformPreview {
    fn load(&mut self, wav: &[u8]) -> Result<()> {
        let audio = read_wav_stream(wav)?;
        let peaks = extract_waveform_peaks(&audio, Some(self.num_peaks))?;
        self.peaks.send_replace(Some(peaks));
        Ok(())
    }

    fn clear(&mut self) {
        self.peaks.send_replace(None);
    }

    fn release(&mut self) {
        self.peaks.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder::encode_wav;
    use std::sync::{Arc, Mutex};

    /// Records what the slot does to it
    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl PreviewSink for RecordingSink {
        fn load(&mut self, wav: &[u8]) -> Result<()> {
            self.events.lock().unwrap().push(format!("load {}", wav.len()));
            Ok(())
        }

        fn clear(&mut self) {
            self.events.lock().unwrap().push("clear".to_string());
        }

        fn release(&mut self) {
            self.events.lock().unwrap().push("release".to_string());
        }
    }

    struct FailingSink;

    impl PreviewSink for FailingSink {
        fn load(&mut self, _wav: &[u8]) -> Result<()> {
            Err(AudioError::Playback("device gone".to_string()))
        }
    }

    #[test]
    fn test_acquire_releases_previous_sink() {
        let first = RecordingSink::default();
        let second = RecordingSink::default();
        let mut slot = PreviewSlot::new();

        slot.acquire(Box::new(first.clone()));
        slot.acquire(Box::new(second.clone()));

        assert_eq!(*first.events.lock().unwrap(), vec!["release"]);
        assert!(second.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drop_releases_sink() {
        let sink = RecordingSink::default();
        {
            let mut slot = PreviewSlot::new();
            slot.acquire(Box::new(sink.clone()));
            slot.publish(&[0u8; 48]);
        }

        assert_eq!(*sink.events.lock().unwrap(), vec!["load 48", "release"]);
    }

    #[test]
    fn test_publish_without_sink_is_noop() {
        let mut slot = PreviewSlot::new();
        slot.publish(&[1, 2, 3]);
        slot.clear();
        assert!(!slot.is_attached());
    }

    #[test]
    fn test_failing_sink_does_not_panic() {
        let mut slot = PreviewSlot::new();
        slot.acquire(Box::new(FailingSink));
        slot.publish(&[0u8; 44]);
        assert!(slot.is_attached());
    }

    #[test]
    fn test_waveform_preview_publishes_peaks() {
        let audio = PcmBuffer::new(8000, vec![vec![0.5; 800], vec![-0.25; 800]]).unwrap();
        let mut preview = WaveformPreview::new(8);
        let receiver = preview.subscribe();

        preview.load(&encode_wav(&audio)).unwrap();

        let peaks = receiver.borrow().clone().unwrap();
        assert_eq!(peaks.num_peaks, 8);
        assert_eq!(peaks.channels, 2);
        assert!(peaks.max_peaks.iter().all(|&p| (p - 0.5).abs() < 1e-3));
        assert!(peaks.min_peaks.iter().all(|&p| (p + 0.25).abs() < 1e-3));

        preview.clear();
        assert!(receiver.borrow().is_none());
    }

    #[test]
    fn test_read_wav_stream_rejects_garbage() {
        assert!(read_wav_stream(b"nope").is_err());
    }
}
