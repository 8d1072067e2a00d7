//! Workspace tuning knobs.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::geometry::placeholder::{DEFAULT_PLACEHOLDER_RINGS, DEFAULT_PLACEHOLDER_SEGMENTS};
use crate::model::window::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Smallest width a restored window may have.
pub const DEFAULT_MIN_WINDOW_WIDTH: f64 = 200.0;
/// Smallest height a restored window may have.
pub const DEFAULT_MIN_WINDOW_HEIGHT: f64 = 150.0;
pub const DEFAULT_MOVE_DEBOUNCE_MS: u64 = 500;
/// 256 MiB.
pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("config field `{field}` is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub min_window_width: f64,
    pub min_window_height: f64,
    pub default_window_width: f64,
    pub default_window_height: f64,
    /// Quiet period before a movement-triggered save fires.
    pub move_debounce_ms: u64,
    /// Files above this size fail with a memory error instead of loading.
    pub max_import_bytes: u64,
    pub placeholder_segments: usize,
    pub placeholder_rings: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            min_window_width: DEFAULT_MIN_WINDOW_WIDTH,
            min_window_height: DEFAULT_MIN_WINDOW_HEIGHT,
            default_window_width: DEFAULT_WINDOW_WIDTH,
            default_window_height: DEFAULT_WINDOW_HEIGHT,
            move_debounce_ms: DEFAULT_MOVE_DEBOUNCE_MS,
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            placeholder_segments: DEFAULT_PLACEHOLDER_SEGMENTS,
            placeholder_rings: DEFAULT_PLACEHOLDER_RINGS,
        }
    }
}

impl WorkspaceConfig {
    /// Loads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("min_window_width", self.min_window_width)?;
        positive("min_window_height", self.min_window_height)?;
        positive("default_window_width", self.default_window_width)?;
        positive("default_window_height", self.default_window_height)?;
        if self.default_window_width < self.min_window_width
            || self.default_window_height < self.min_window_height
        {
            return Err(ConfigError::InvalidValue {
                field: "default_window_width",
                reason: "default window size is below the minimum".to_string(),
            });
        }
        if self.max_import_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_import_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.placeholder_segments < 3 {
            return Err(ConfigError::InvalidValue {
                field: "placeholder_segments",
                reason: format!("need at least 3, got {}", self.placeholder_segments),
            });
        }
        if self.placeholder_rings < 2 {
            return Err(ConfigError::InvalidValue {
                field: "placeholder_rings",
                reason: format!("need at least 2, got {}", self.placeholder_rings),
            });
        }
        Ok(())
    }

    pub fn move_debounce(&self) -> Duration {
        Duration::from_millis(self.move_debounce_ms)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}
