// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{FacingMode, SessionConfig};
use crate::constants::{storage, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// User configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera requested when the session starts
    pub initial_facing: FacingMode,
    /// How long to wait for the preview's first frame, in milliseconds
    pub first_frame_timeout_ms: u64,
    /// Where saved photos go (defaults to the pictures directory)
    pub photos_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_facing: FacingMode::Rear, // Environment-facing camera first
            first_frame_timeout_ms: timing::FIRST_FRAME_TIMEOUT.as_millis() as u64,
            photos_dir: None,
        }
    }
}

impl Config {
    /// `<config_dir>/photobooth/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(storage::APP_DIR).join(storage::CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "Config loaded");
        Ok(config)
    }

    /// Reject values no session could work with
    pub fn validate(&self) -> AppResult<()> {
        if self.first_frame_timeout_ms == 0 {
            return Err(AppError::Config(
                "first_frame_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Session settings derived from this config
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initial_facing: self.initial_facing,
            first_frame_timeout: Duration::from_millis(self.first_frame_timeout_ms),
        }
    }

    /// Effective photo directory
    pub fn photos_dir(&self) -> PathBuf {
        self.photos_dir
            .clone()
            .unwrap_or_else(crate::storage::default_photos_dir)
    }
}
