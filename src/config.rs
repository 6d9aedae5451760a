use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::waveform::DEFAULT_NUM_PEAKS;
use crate::error::{AudioError, Result};

/// File name offered for downloads when none is configured
pub const DEFAULT_EXPORT_FILE_NAME: &str = "trimmed-audio.wav";

/// Engine settings
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "history_limit": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo steps kept; `null` for unlimited
    pub history_limit: Option<usize>,

    /// Suggested file name for exported WAV files
    pub export_file_name: String,

    /// Number of peaks computed for the waveform preview
    pub preview_peaks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            preview_peaks: DEFAULT_NUM_PEAKS,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| AudioError::FileOpen {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.preview_peaks == 0 {
            return Err(AudioError::InvalidArgument(
                "preview_peaks must be greater than 0".to_string(),
            ));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(AudioError::InvalidArgument(
                "export_file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_limit, None);
        assert_eq!(config.export_file_name, "trimmed-audio.wav");
        assert_eq!(config.preview_peaks, 2000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "history_limit": 20 }"#).unwrap();
        assert_eq!(config.history_limit, Some(20));
        assert_eq!(config.preview_peaks, DEFAULT_NUM_PEAKS);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let result = EngineConfig::from_json_str("{ history_limit: ");
        assert!(matches!(result, Err(AudioError::Config(_))));
    }

    #[test]
    fn test_zero_peaks_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "preview_peaks": 0 }"#);
        assert!(matches!(result, Err(AudioError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_json_file("/nonexistent/audiocut.json");
        assert!(matches!(result, Err(AudioError::FileOpen { .. })));
    }
}
