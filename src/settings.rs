use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pdf::{
    DEFAULT_CACHE_SIZE, DEFAULT_CALM_DOWN, DEFAULT_CURRENT_PAGE_THRESHOLD, DEFAULT_HORIZONTAL_MARGIN,
    DEFAULT_PRESETS, DEFAULT_UNIT_CONVERSION, DEFAULT_VERTICAL_MARGIN, PresetError, PresetScales,
    PullStrategy, SchedulerConfig, ViewerConfig, ZoomConfig,
};

pub const CURRENT_VERSION: u32 = 1;
const APP_NAME: &str = "folio";
const SETTINGS_FILENAME: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("invalid zoom presets: {0}")]
    Presets(#[from] PresetError),

    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Ascending zoom scales for zoom in/out and preset selection
    #[serde(default = "default_presets")]
    pub zoom_presets: Vec<f32>,

    #[serde(default = "default_horizontal_margin")]
    pub horizontal_margin: f32,

    #[serde(default = "default_vertical_margin")]
    pub vertical_margin: f32,

    /// Document units to CSS pixels
    #[serde(default = "default_unit_conversion")]
    pub unit_conversion: f32,

    #[serde(default = "default_threshold")]
    pub current_page_threshold: u32,

    /// Quiet period after the last draw before wheel input is accepted again
    #[serde(default = "default_calm_down_ms")]
    pub calm_down_ms: u64,

    #[serde(default = "default_true")]
    pub prefetch: bool,

    #[serde(default)]
    pub pull_strategy: PullStrategy,

    /// Documents kept in memory
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_presets() -> Vec<f32> {
    DEFAULT_PRESETS.to_vec()
}

fn default_horizontal_margin() -> f32 {
    DEFAULT_HORIZONTAL_MARGIN
}

fn default_vertical_margin() -> f32 {
    DEFAULT_VERTICAL_MARGIN
}

fn default_unit_conversion() -> f32 {
    DEFAULT_UNIT_CONVERSION
}

fn default_threshold() -> u32 {
    DEFAULT_CURRENT_PAGE_THRESHOLD
}

fn default_calm_down_ms() -> u64 {
    DEFAULT_CALM_DOWN.as_millis() as u64
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            zoom_presets: default_presets(),
            horizontal_margin: default_horizontal_margin(),
            vertical_margin: default_vertical_margin(),
            unit_conversion: default_unit_conversion(),
            current_page_threshold: default_threshold(),
            calm_down_ms: default_calm_down_ms(),
            prefetch: true,
            pull_strategy: PullStrategy::default(),
            cache_size: default_cache_size(),
        }
    }
}

impl Settings {
    /// Validate and convert into the viewer configuration
    pub fn viewer_config(&self) -> Result<ViewerConfig, SettingsError> {
        if self.unit_conversion.is_nan() || self.unit_conversion <= 0.0 {
            return Err(SettingsError::NotPositive {
                field: "unit_conversion",
                value: self.unit_conversion,
            });
        }

        Ok(ViewerConfig {
            zoom: ZoomConfig {
                presets: PresetScales::new(self.zoom_presets.clone())?,
                horizontal_margin: self.horizontal_margin,
                vertical_margin: self.vertical_margin,
                unit_conversion: self.unit_conversion,
            },
            scheduler: SchedulerConfig {
                current_page_threshold: self.current_page_threshold.min(100),
                calm_down: Duration::from_millis(self.calm_down_ms),
                prefetch: self.prefetch,
            },
            pull_strategy: self.pull_strategy,
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Read settings from a YAML file, or TOML when the extension says so
pub fn load_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut settings: Settings = if is_toml(path) {
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
    };
    debug!("Loaded settings from {path:?}");

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
    }
    Ok(settings)
}

/// Load settings from `path` or the default location, falling back to
/// defaults when the file is missing or broken
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return Settings::default();
            }
        },
    };

    if !path.exists() {
        info!("Settings file {path:?} not found, using defaults");
        return Settings::default();
    }
    match load_from_path(&path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    let io_error = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(settings).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
    } else {
        serde_yaml::to_string(settings).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
    };
    fs::write(path, content).map_err(io_error)?;
    debug!("Saved settings to {path:?}");
    Ok(())
}
