// src/audio/playback.rs
//! Audio playback of the previewed buffer using cpal
//!
//! The player is a preview sink: every edit hands it the new WAV stream,
//! and play/pause/seek act on whatever was loaded last.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{AudioError, Result};
use crate::preview::{read_wav_stream, PreviewSink};

/// Shared state for audio playback - all atomic for thread safety
struct SharedPlaybackState {
    is_playing: AtomicBool,
    current_frame: AtomicU64,
    total_frames: AtomicU64,
    sample_rate: AtomicU64,
    should_stop: AtomicBool,
    seek_to_frame: AtomicU64,
    seek_pending: AtomicBool,
}

impl SharedPlaybackState {
    fn new() -> Self {
        Self {
            is_playing: AtomicBool::new(false),
            current_frame: AtomicU64::new(0),
            total_frames: AtomicU64::new(0),
            sample_rate: AtomicU64::new(44100),
            should_stop: AtomicBool::new(false),
            seek_to_frame: AtomicU64::new(0),
            seek_pending: AtomicBool::new(false),
        }
    }
}

/// Interleaved samples ready for the output device
struct LoadedAudio {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

/// Audio player that manages playback in a background thread
///
/// The cpal Stream lives entirely in the background thread. Clones share
/// the same playback, so one clone can be attached to the engine as a
/// preview while another drives play/pause.
#[derive(Clone)]
pub struct AudioPlayer {
    state: Arc<SharedPlaybackState>,
    playback_thread: Arc<Mutex<Option<JoinHandle<()>>>>,
    loaded: Arc<Mutex<Option<LoadedAudio>>>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SharedPlaybackState::new()),
            playback_thread: Arc::new(Mutex::new(None)),
            loaded: Arc::new(Mutex::new(None)),
        }
    }

    /// Start playing the loaded audio from the beginning
    pub fn play(&self) -> Result<()> {
        self.stop();

        let audio = {
            let loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
            let audio = loaded
                .as_ref()
                .ok_or_else(|| AudioError::Playback("nothing loaded".to_string()))?;
            LoadedAudio {
                samples: Arc::clone(&audio.samples),
                channels: audio.channels,
                sample_rate: audio.sample_rate,
            }
        };

        let state = Arc::clone(&self.state);
        state.should_stop.store(false, Ordering::SeqCst);
        state.current_frame.store(0, Ordering::SeqCst);
        state.is_playing.store(true, Ordering::SeqCst);

        let handle = thread::spawn(move || {
            if let Err(e) = run_playback(audio, Arc::clone(&state)) {
                tracing::error!("Playback error: {}", e);
                state.is_playing.store(false, Ordering::SeqCst);
            }
        });

        *self.playback_thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Pause playback
    pub fn pause(&self) {
        self.state.is_playing.store(false, Ordering::SeqCst);
    }

    /// Resume playback
    pub fn resume(&self) {
        self.state.is_playing.store(true, Ordering::SeqCst);
    }

    /// Toggle play/pause
    pub fn toggle(&self) {
        let current = self.state.is_playing.load(Ordering::SeqCst);
        self.state.is_playing.store(!current, Ordering::SeqCst);
    }

    /// Seek to a specific time in seconds
    pub fn seek(&self, time_seconds: f64) {
        let rate = self.state.sample_rate.load(Ordering::SeqCst);
        let frame = (time_seconds.max(0.0) * rate as f64) as u64;
        self.state.seek_to_frame.store(frame, Ordering::SeqCst);
        self.state.seek_pending.store(true, Ordering::SeqCst);
    }

    /// Stop playback completely
    pub fn stop(&self) {
        self.state.should_stop.store(true, Ordering::SeqCst);
        self.state.is_playing.store(false, Ordering::SeqCst);

        // Wait for playback thread to finish
        let handle = self
            .playback_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        self.state.current_frame.store(0, Ordering::SeqCst);
    }

    /// Get the current playback state: (is_playing, position, duration) in seconds
    pub fn get_state(&self) -> (bool, f64, f64) {
        let is_playing = self.state.is_playing.load(Ordering::SeqCst);
        let frame = self.state.current_frame.load(Ordering::SeqCst);
        let total = self.state.total_frames.load(Ordering::SeqCst);
        let rate = self.state.sample_rate.load(Ordering::SeqCst);

        if rate == 0 {
            return (is_playing, 0.0, 0.0);
        }

        (is_playing, frame as f64 / rate as f64, total as f64 / rate as f64)
    }

    fn unload(&self) {
        self.stop();
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.state.total_frames.store(0, Ordering::SeqCst);
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSink for AudioPlayer {
    fn load(&mut self, wav: &[u8]) -> Result<()> {
        let audio = read_wav_stream(wav)?;
        self.stop();

        let channels: Vec<&[f32]> = audio.channels().collect();
        let mut samples = Vec::with_capacity(audio.frame_count() * channels.len());
        for frame in 0..audio.frame_count() {
            samples.extend(channels.iter().map(|c| c[frame]));
        }

        self.state
            .total_frames
            .store(audio.frame_count() as u64, Ordering::SeqCst);
        self.state
            .sample_rate
            .store(audio.sample_rate() as u64, Ordering::SeqCst);

        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = Some(LoadedAudio {
            samples: Arc::new(samples),
            channels: audio.channel_count() as u16,
            sample_rate: audio.sample_rate(),
        });
        Ok(())
    }

    fn clear(&mut self) {
        self.unload();
    }

    fn release(&mut self) {
        self.unload();
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        // last handle going away
        if Arc::strong_count(&self.playback_thread) == 1 {
            self.stop();
        }
    }
}

/// Run the audio playback loop in a dedicated thread
fn run_playback(audio: LoadedAudio, state: Arc<SharedPlaybackState>) -> Result<()> {
    let channels = audio.channels as usize;
    let samples = audio.samples;

    if samples.is_empty() {
        state.is_playing.store(false, Ordering::SeqCst);
        return Ok(());
    }

    // Set up cpal audio output
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Playback("No output device available".to_string()))?;

    let config = StreamConfig {
        channels: audio.channels,
        sample_rate: cpal::SampleRate(audio.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    // Shared sample buffer and read position
    let samples_clone = Arc::clone(&samples);
    let state_clone = Arc::clone(&state);
    let read_pos = Arc::new(AtomicU64::new(0));
    let read_pos_clone = Arc::clone(&read_pos);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !state_clone.is_playing.load(Ordering::SeqCst) {
                    // Output silence when paused
                    data.fill(0.0);
                    return;
                }

                let pos = read_pos_clone.load(Ordering::SeqCst) as usize;
                for (i, sample) in data.iter_mut().enumerate() {
                    *sample = samples_clone.get(pos + i).copied().unwrap_or(0.0);
                }

                let new_pos = (pos + data.len()).min(samples_clone.len());
                read_pos_clone.store(new_pos as u64, Ordering::SeqCst);
                state_clone
                    .current_frame
                    .store((new_pos / channels) as u64, Ordering::SeqCst);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::Playback(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| AudioError::Playback(format!("Failed to start stream: {}", e)))?;

    // Main loop - handle seek and wait for completion
    loop {
        if state.should_stop.load(Ordering::SeqCst) {
            break;
        }

        if state.seek_pending.swap(false, Ordering::SeqCst) {
            let seek_frame = state.seek_to_frame.load(Ordering::SeqCst);
            let seek_sample = (seek_frame as usize * channels).min(samples.len());
            read_pos.store(seek_sample as u64, Ordering::SeqCst);
            state
                .current_frame
                .store((seek_sample / channels) as u64, Ordering::SeqCst);
        }

        if read_pos.load(Ordering::SeqCst) as usize >= samples.len() {
            state.is_playing.store(false, Ordering::SeqCst);
            state.current_frame.store(0, Ordering::SeqCst);
            break;
        }

        thread::sleep(Duration::from_millis(50));
    }

    Ok(())
}
