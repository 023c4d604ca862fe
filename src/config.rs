//! Viewer settings with TOML file support.
//!
//! Every section is `#[serde(default)]`, so a file overriding only
//! `[camera]` works.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::import::ImportOptions;
use crate::view::ShadingMode;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MESHVIEW_CONFIG";
/// Picked up from the working directory when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "meshview.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub import: ImportOptions,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { width: 1600, height: 1200, title: "meshview".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub z_near: f32,
    /// Lower bound; widened at load time to cover the model.
    pub z_far: f32,
    /// World units per second before the adaptive multiplier.
    pub base_speed: f32,
    /// Degrees per pointer unit.
    pub sensitivity: f32,
    /// Seconds of forward/backward movement per scroll line.
    pub scroll_step: f32,
    pub adaptive_speed: bool,
    /// Extra distance factor when framing the model at startup.
    pub fit_padding: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            z_near: 0.1,
            z_far: 100.0,
            base_speed: 2.5,
            sensitivity: 0.05,
            scroll_step: 0.1,
            adaptive_speed: true,
            fit_padding: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: [f32; 3],
    pub shading: ShadingMode,
    /// Direction the light travels, world space.
    pub light_direction: [f32; 3],
    pub ambient: f32,
    pub base_color: [f32; 3],
    pub show_overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.1],
            shading: ShadingMode::Lit,
            light_direction: [-0.4, -1.0, -0.3],
            ambient: 0.2,
            base_color: [0.8, 0.8, 0.8],
            show_overlay: true,
        }
    }
}

impl ViewerConfig {
    /// Load from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ViewerError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ViewerError::Config { path: path.to_path_buf(), message: e.to_string() })
    }

    /// Resolve the config source: `$MESHVIEW_CONFIG`, then `./meshview.toml`,
    /// then defaults.
    pub fn discover() -> Result<Self> {
        match Self::discover_path(std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn discover_path(from_env: Option<PathBuf>) -> Option<PathBuf> {
        from_env.or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        })
    }
}
