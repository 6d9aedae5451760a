// src/session.rs
//! Async front for the engine
//!
//! Decoding can take a while, so `EditSession::load` runs it on tokio's
//! blocking pool. Loads are numbered; when a decode finishes after a newer
//! load (or a `remove`) has started, its result is thrown away and the call
//! reports `LoadOutcome::Superseded`. Only the latest load is ever installed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::audio::decoder::AudioDecoder;
use crate::audio::types::AudioInfo;
use crate::engine::Engine;
use crate::error::{AudioError, Result};

/// What became of a load request
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The decoded audio is now the current source
    Loaded(AudioInfo),
    /// A later load or remove replaced this request; nothing was installed
    Superseded,
}

/// Shared handle to an engine for async callers
#[derive(Clone)]
pub struct EditSession {
    engine: Arc<Mutex<Engine>>,
    decoder: Arc<dyn AudioDecoder>,
    load_generation: Arc<AtomicU64>,
}

impl EditSession {
    pub fn new(engine: Engine) -> Self {
        let decoder = engine.decoder();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            decoder,
            load_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Decode `bytes` off the async runtime and install them if still wanted
    ///
    /// Decode failures of the latest load are returned to the caller.
    pub async fn load(&self, bytes: Vec<u8>) -> Result<LoadOutcome> {
        let ticket = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(ticket, bytes = bytes.len(), "Starting load");

        let decoder = Arc::clone(&self.decoder);
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| AudioError::DecodeFailed(format!("Task join error: {}", e)))?;

        if !self.is_latest(ticket) {
            tracing::debug!(ticket, "Discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }

        let buffer = decoded?;

        let mut engine = self.engine.lock().await;
        // a remove or newer load may have started while we waited for the lock
        if !self.is_latest(ticket) {
            tracing::debug!(ticket, "Discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }

        Ok(LoadOutcome::Loaded(engine.install(buffer).info()))
    }

    pub async fn trim(&self, start_seconds: f64, end_seconds: f64) -> bool {
        self.engine.lock().await.trim(start_seconds, end_seconds)
    }

    pub async fn undo(&self) -> bool {
        self.engine.lock().await.undo()
    }

    pub async fn redo(&self) -> bool {
        self.engine.lock().await.redo()
    }

    pub async fn export_wav(&self) -> Option<Vec<u8>> {
        self.engine.lock().await.export_wav()
    }

    /// Discard the source, including any load still decoding
    pub async fn remove(&self) {
        self.load_generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().await.remove();
    }

    pub async fn info(&self) -> Option<AudioInfo> {
        self.engine.lock().await.info()
    }

    /// Direct access to the engine for anything not wrapped here
    pub async fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().await
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.load_generation.load(Ordering::SeqCst) == ticket
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("load_generation", &self.load_generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
