use thiserror::Error;

/// All possible errors that can occur while loading, editing or exporting audio
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open or read the audio file from disk
    #[error("Failed to open audio file '{path}': {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    /// The input bytes are not in a format the decoder recognizes
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Error occurred while decoding the audio data
    #[error("Audio decoding failed: {0}")]
    DecodeFailed(String),

    /// A PCM buffer was constructed with inconsistent channels or rate
    #[error("Invalid PCM buffer: {0}")]
    InvalidBuffer(String),

    /// A caller-supplied argument is out of its accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An export was requested while no source is loaded
    #[error("No audio source is loaded")]
    NoSource,

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The playback device or stream failed
    #[error("Playback failed: {0}")]
    Playback(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from hound WAV reader
    #[error("Hound WAV error: {0}")]
    Hound(#[from] hound::Error),
}

impl AudioError {
    /// True for the failures that mean "these bytes are not playable audio"
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            AudioError::DecodeFailed(_) | AudioError::UnsupportedFormat(_) | AudioError::Hound(_)
        )
    }
}

/// Convenient Result type that uses our AudioError
pub type Result<T> = std::result::Result<T, AudioError>;
