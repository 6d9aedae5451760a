pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod preview;
pub mod session;

// Re-export for convenience
pub use audio::*;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{AudioError, Result};
pub use history::EditHistory;
pub use preview::{PreviewSink, PreviewSlot, WaveformPreview};
pub use session::{EditSession, LoadOutcome};
