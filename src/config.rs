//! Tunable constants for a sync session.
//!
//! Every field has a default, so a partial JSON object (or `{}`) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::cursor::DEFAULT_STEP_THRESHOLD;
use crate::locator::{MAX_OFFSET_SECONDS, OFFSET_STEP_SECONDS};
use crate::timemap::{DEFAULT_DIVISIONS, DEFAULT_TEMPO};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Largest forward move done by stepping instead of rewinding
    pub step_threshold: usize,
    /// Largest offset magnitude in seconds
    pub offset_limit_seconds: f64,
    /// Offset granularity in seconds
    pub offset_step_seconds: f64,
    /// Tempo used when the score has no tempo marking
    pub default_tempo_bpm: f64,
    /// Divisions used when the score has no `<divisions>`
    pub default_divisions: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            step_threshold: DEFAULT_STEP_THRESHOLD,
            offset_limit_seconds: MAX_OFFSET_SECONDS,
            offset_step_seconds: OFFSET_STEP_SECONDS,
            default_tempo_bpm: DEFAULT_TEMPO,
            default_divisions: DEFAULT_DIVISIONS,
        }
    }
}

impl SyncConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid sync config: {e}"))
    }

    /// Read a JSON configuration file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {e}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(SyncConfig::from_json("{}").unwrap(), SyncConfig::default());
    }

    #[test]
    fn defaults_match_engine_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.step_threshold, 5);
        assert_eq!(config.offset_limit_seconds, 2.0);
        assert_eq!(config.offset_step_seconds, 0.1);
        assert_eq!(config.default_tempo_bpm, 96.0);
        assert_eq!(config.default_divisions, 1.0);
    }

    #[test]
    fn partial_override() {
        let config = SyncConfig::from_json(r#"{"stepThreshold": 8, "defaultTempoBpm": 139}"#).unwrap();
        assert_eq!(config.step_threshold, 8);
        assert_eq!(config.default_tempo_bpm, 139.0);
        assert_eq!(config.offset_limit_seconds, 2.0);
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = SyncConfig::from_json("{").unwrap_err();
        assert!(err.starts_with("Invalid sync config"));
    }
}
