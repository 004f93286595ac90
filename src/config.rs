// Configuration - Playback tunables loaded from RON

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "spacejam";
const CONFIG_FILE: &str = "config.ron";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Playback tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Master bus gain of a new session
    pub master_gain: f32,
    /// Delay between the toggle and the first loop, in seconds
    pub start_delay: f64,
    /// Re-arm period as a fraction of the loop duration
    pub rearm_ratio: f64,
    /// Master fade-out length on stop, in seconds
    pub fade_out: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.55,
            start_delay: 0.05,
            rearm_ratio: 0.8,
            fade_out: 0.5,
        }
    }
}

impl PlaybackConfig {
    /// `<config_dir>/spacejam/config.ron`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit file, or from the default location
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.master_gain > 0.0 && self.master_gain.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "master_gain must be > 0, got {}",
                self.master_gain
            )));
        }
        if !(self.start_delay >= 0.0 && self.start_delay.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "start_delay must be >= 0, got {}",
                self.start_delay
            )));
        }
        if !(self.rearm_ratio > 0.0 && self.rearm_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "rearm_ratio must be in (0, 1], got {}",
                self.rearm_ratio
            )));
        }
        if !(self.fade_out > 0.0 && self.fade_out.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "fade_out must be > 0, got {}",
                self.fade_out
            )));
        }
        Ok(())
    }
}
