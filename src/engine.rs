// src/engine.rs
//! The edit engine: the one entry point a front end talks to
//!
//! Holds the current buffer and its history. Only decoding can fail from
//! the caller's point of view; trimming, undoing or exporting with nothing
//! loaded (or nothing to undo) simply does nothing, so a UI can disable
//! controls from `is_loaded`/`can_undo`/`can_redo` instead of handling
//! errors.

use std::path::Path;
use std::sync::Arc;

use crate::audio::decoder::{AudioDecoder, SymphoniaDecoder};
use crate::audio::encoder::{encode_wav, write_wav_file};
use crate::audio::types::{AudioInfo, PcmBuffer, TrimRange};
use crate::config::EngineConfig;
use crate::error::{AudioError, Result};
use crate::history::EditHistory;
use crate::preview::{PreviewSink, PreviewSlot};

pub struct Engine {
    config: EngineConfig,
    decoder: Arc<dyn AudioDecoder>,
    current: Option<PcmBuffer>,
    history: EditHistory,
    preview: PreviewSlot,
}

impl Engine {
    /// Engine backed by the symphonia decoder
    pub fn new(config: EngineConfig) -> Self {
        Self::with_decoder(config, Arc::new(SymphoniaDecoder::new()))
    }

    /// Engine backed by a caller-supplied decoder
    pub fn with_decoder(config: EngineConfig, decoder: Arc<dyn AudioDecoder>) -> Self {
        let history = EditHistory::new(config.history_limit);
        Self {
            config,
            decoder,
            current: None,
            history,
            preview: PreviewSlot::new(),
        }
    }

    /// Decode `bytes` and make the result the current buffer
    ///
    /// History is cleared on success. On failure the engine keeps whatever
    /// it had before.
    ///
    /// # Example
    /// ```
    /// use audiocut::{encode_wav, Engine, EngineConfig, PcmBuffer};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let source = encode_wav(&PcmBuffer::silence(44100, 2, 88200)?);
    ///
    /// let mut engine = Engine::new(EngineConfig::default());
    /// engine.load(&source)?;
    /// engine.trim(0.5, 1.5);
    ///
    /// let wav = engine.export_wav().expect("source is loaded");
    /// assert_eq!(wav.len(), 44 + 44100 * 2 * 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(&mut self, bytes: &[u8]) -> Result<&PcmBuffer> {
        self.load_with_hint(bytes, None)
    }

    /// Read a file from disk and load it, hinting the decoder with its extension
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&PcmBuffer> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AudioError::FileOpen {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let extension = path.extension().and_then(|ext| ext.to_str());
        self.load_with_hint(&bytes, extension)
    }

    fn load_with_hint(&mut self, bytes: &[u8], extension: Option<&str>) -> Result<&PcmBuffer> {
        let buffer = self.decoder.decode_with_hint(bytes, extension).map_err(|e| {
            tracing::error!("Failed to decode audio: {}", e);
            e
        })?;
        Ok(self.install(buffer))
    }

    /// Make an already decoded buffer the current source
    pub(crate) fn install(&mut self, buffer: PcmBuffer) -> &PcmBuffer {
        tracing::info!(
            sample_rate = buffer.sample_rate(),
            channels = buffer.channel_count(),
            frames = buffer.frame_count(),
            "Loaded audio source"
        );

        self.history.reset();
        if self.preview.is_attached() {
            self.preview.publish(&encode_wav(&buffer));
        }
        self.current.insert(buffer)
    }

    /// Keep only `[start_seconds, end_seconds)` of the current buffer
    ///
    /// Times are sanitized and clamped rather than rejected. Returns `false`
    /// when nothing is loaded.
    pub fn trim(&mut self, start_seconds: f64, end_seconds: f64) -> bool {
        let range = TrimRange::new(start_seconds, end_seconds);
        let Some(current) = self.current.as_mut() else {
            tracing::debug!("Trim ignored: no source loaded");
            return false;
        };

        self.history.record_trim(current, &range);
        tracing::info!(
            start = range.start_seconds,
            end = range.end_seconds,
            frames = current.frame_count(),
            "Trimmed audio"
        );
        self.publish_current();
        true
    }

    /// Step back one edit. Returns `false` when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        if !self.history.undo(current) {
            return false;
        }

        tracing::info!(frames = current.frame_count(), "Undo");
        self.publish_current();
        true
    }

    /// Step forward one undone edit. Returns `false` when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        if !self.history.redo(current) {
            return false;
        }

        tracing::info!(frames = current.frame_count(), "Redo");
        self.publish_current();
        true
    }

    /// The current buffer as a WAV byte stream, or `None` when nothing is loaded
    pub fn export_wav(&self) -> Option<Vec<u8>> {
        self.current.as_ref().map(encode_wav)
    }

    /// Write the current buffer to `output_path` as WAV
    pub fn save_wav<P: AsRef<Path>>(&self, output_path: P) -> Result<()> {
        let current = self.current.as_ref().ok_or(AudioError::NoSource)?;
        write_wav_file(current, output_path.as_ref())?;
        tracing::info!(path = %output_path.as_ref().display(), "Saved WAV");
        Ok(())
    }

    /// Drop the source and its history, back to the initial state
    pub fn remove(&mut self) {
        if self.current.take().is_some() {
            tracing::info!("Removed audio source");
        }
        self.history.reset();
        self.preview.clear();
    }

    pub fn current(&self) -> Option<&PcmBuffer> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.is_loaded() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.is_loaded() && self.history.can_redo()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn info(&self) -> Option<AudioInfo> {
        self.current.as_ref().map(PcmBuffer::info)
    }

    /// The whole current buffer as a range, the natural starting selection
    pub fn default_range(&self) -> Option<TrimRange> {
        self.current
            .as_ref()
            .map(TrimRange::covering)
    }

    /// Suggested download name for `export_wav` output
    pub fn export_file_name(&self) -> &str {
        &self.config.export_file_name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn decoder(&self) -> Arc<dyn AudioDecoder> {
        Arc::clone(&self.decoder)
    }

    /// Attach a preview, releasing the previous one
    ///
    /// The new sink immediately receives the current buffer, if any.
    pub fn attach_preview(&mut self, sink: Box<dyn PreviewSink>) {
        self.preview.acquire(sink);
        self.publish_current();
    }

    pub fn detach_preview(&mut self) {
        self.preview.release();
    }

    fn publish_current(&mut self) {
        if !self.preview.is_attached() {
            return;
        }
        if let Some(current) = self.current.as_ref() {
            self.preview.publish(&encode_wav(current));
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("current", &self.info())
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("preview", &self.preview)
            .finish()
    }
}
