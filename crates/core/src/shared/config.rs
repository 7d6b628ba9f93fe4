use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DETECTOR_CONFIDENCE, DEFAULT_ENROLLMENT_DIR,
    DEFAULT_LBPH_GRID, DEFAULT_MAX_TRACK_DISTANCE, DEFAULT_MODEL_PATH,
    DEFAULT_RESTART_DELAY_SECS, DEFAULT_SOURCE, DEFAULT_STABILITY_FRAMES,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Every tunable of the tracker, trainer and supervisor.
///
/// Stored as JSON; absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame source: camera device, video file or stream URL.
    pub source: String,
    pub enrollment_dir: PathBuf,
    /// Where the trained recognition model is read from and written to.
    pub model_path: PathBuf,
    /// Explicit detector model; downloaded to the cache when unset.
    pub detector_model: Option<PathBuf>,
    pub detector_confidence: f64,
    pub confidence_threshold: f64,
    pub max_track_distance: f64,
    pub stability_frames: u32,
    pub lbph_grid: u32,
    pub restart_delay_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            enrollment_dir: PathBuf::from(DEFAULT_ENROLLMENT_DIR),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            detector_model: None,
            detector_confidence: DEFAULT_DETECTOR_CONFIDENCE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_track_distance: DEFAULT_MAX_TRACK_DISTANCE,
            stability_frames: DEFAULT_STABILITY_FRAMES,
            lbph_grid: DEFAULT_LBPH_GRID,
            restart_delay_secs: DEFAULT_RESTART_DELAY_SECS,
        }
    }
}

impl EngineConfig {
    /// Per-user config location, e.g. `~/.config/AutoEnroll/config.json`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("AutoEnroll").join("config.json"))
    }

    /// Loads an explicit config file, failing if it is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads `explicit` if given, else the per-user file if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::user_config_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.confidence_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "Confidence threshold must be finite, got {}",
                self.confidence_threshold
            )));
        }
        if !(self.max_track_distance.is_finite() && self.max_track_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "Max track distance must be positive, got {}",
                self.max_track_distance
            )));
        }
        if self.stability_frames == 0 {
            return Err(ConfigError::Invalid(
                "Stability frames must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detector_confidence) {
            return Err(ConfigError::Invalid(format!(
                "Detector confidence must be between 0.0 and 1.0, got {}",
                self.detector_confidence
            )));
        }
        if self.lbph_grid == 0 {
            return Err(ConfigError::Invalid(
                "LBPH grid must be at least 1".to_string(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(ConfigError::Invalid("Source must not be empty".to_string()));
        }
        Ok(())
    }
}
