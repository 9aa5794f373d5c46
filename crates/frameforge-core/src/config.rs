//! Canvas configuration.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::selection::{HANDLE_SIZE, HandleMetrics, MIN_SIZE, ROTATE_HANDLE_OFFSET};
use crate::snap::{ALIGN_THRESHOLD, GRID_SIZE, SnapMode};
use crate::units::{DEFAULT_WINDOW_WIDTH, UnitResolver};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No config directory available")]
    NoConfigDir,
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Surface and editing settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    /// Global viewport width used by `vw` units.
    pub window_width: f64,
    /// Global viewport height, used for the resolver's window.
    pub window_height: f64,
    pub show_overlay: bool,
    pub disable_zoom: bool,
    pub snap_mode: SnapMode,
    pub grid_size: f64,
    pub snap_threshold: f64,
    pub min_size: f64,
    pub history_capacity: usize,
    pub handle_size: f64,
    pub rotate_handle_offset: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background_color: "#ffffff".to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: 720.0,
            show_overlay: true,
            disable_zoom: false,
            snap_mode: SnapMode::default(),
            grid_size: GRID_SIZE,
            snap_threshold: ALIGN_THRESHOLD,
            min_size: MIN_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            handle_size: HANDLE_SIZE,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
        }
    }
}

impl CanvasConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        log::info!("Loaded canvas config from {}", path.display());
        Ok(config)
    }

    /// Location of the user's config file.
    pub fn default_path() -> ConfigResult<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("frameforge").join(CONFIG_FILE))
    }

    /// Load the user's config, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load_or_default() -> Self {
        let loaded = Self::default_path().and_then(|path| {
            if path.exists() {
                Self::load_from(&path).map(Some)
            } else {
                Ok(None)
            }
        });
        match loaded {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring canvas config: {}", e);
                Self::default()
            }
        }
    }

    pub fn surface(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn resolver(&self) -> UnitResolver {
        UnitResolver::new(Size::new(self.window_width, self.window_height))
    }

    pub fn handle_metrics(&self) -> HandleMetrics {
        HandleMetrics {
            size: self.handle_size,
            rotate_offset: self.rotate_handle_offset,
        }
    }
}
