//! Application settings
//!
//! Uses RON (Rusty Object Notation) for a human-editable settings file.
//! Every field has a default, so a file only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::rasterizer::PipelineSettings;

/// Default location of the settings file
pub const CONFIG_PATH: &str = "assets/config.ron";

/// Error type for settings loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything the binary reads at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// OBJ file to render; the built-in cube when unset
    pub mesh_path: Option<PathBuf>,
    /// Image used when texturing is on; a checkerboard when unset
    pub texture_path: Option<PathBuf>,
    /// Camera units per second
    pub move_speed: f32,
    /// Radians per second
    pub yaw_speed: f32,
    /// Change in move_speed per key press
    pub speed_step: f32,
    /// Change in distance_bias per second while held
    pub bias_step: f32,
    pub pipeline: PipelineSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: 1080,
            window_height: 720,
            mesh_path: None,
            texture_path: None,
            move_speed: 8.0,
            yaw_speed: 2.0,
            speed_step: 2.0,
            bias_step: 1.0,
            pipeline: PipelineSettings::default(),
        }
    }
}

/// Load settings from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Load settings from a RON string
pub fn load_config_from_str(s: &str) -> Result<AppConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Settings from `path`, or defaults when the file is missing or broken
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> AppConfig {
    let path = path.as_ref();
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded settings from {}", path.display());
            config
        }
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No settings at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(e) => {
            log::warn!("Ignoring settings at {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}
