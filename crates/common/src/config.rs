//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported composites are written.
    pub export_dir: PathBuf,

    /// Default capture settings.
    pub capture: CaptureDefaults,

    /// Default style selections for the editing phase.
    pub style: StyleDefaults,

    /// Renderer settings.
    pub render: RenderSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Layout id selected before a session starts.
    pub layout: String,

    /// Countdown length per shot in seconds.
    pub countdown_secs: u32,

    /// Flip captured frames horizontally, like a selfie camera.
    pub mirror: bool,

    /// What to do when the source has no frame at shutter time.
    pub missed_shot: MissedShotPolicy,
}

/// Handling of a shutter event that finds no frame on the video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissedShotPolicy {
    /// Leave the slot empty and continue with the next countdown.
    #[default]
    Skip,
    /// Poll the source once more after a short delay before giving up.
    RetryOnce,
}

/// Default style choices applied when a session enters editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefaults {
    /// Frame style id.
    pub frame: String,

    /// Filter name.
    pub filter: String,

    /// Brightness in percent, within [50, 150].
    pub brightness: u32,
}

/// Renderer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Regular monospace font used for the footer.
    pub font_path: Option<PathBuf>,

    /// Bold monospace font used for the caption. Falls back to `font_path`.
    pub bold_font_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "snapbooth=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            layout: "grid-4".to_string(),
            countdown_secs: 3,
            mirror: true,
            missed_shot: MissedShotPolicy::Skip,
        }
    }
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            frame: "white".to_string(),
            filter: "Normal".to_string(),
            brightness: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        let mut config = if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if config.export_dir.as_os_str().is_empty() {
            config.export_dir = default_export_dir();
        }
        config
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("snapbooth").join("config.json")
}

/// Default export directory.
fn default_export_dir() -> PathBuf {
    std::env::var("XDG_PICTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Pictures"))
        .join("snapbooth")
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}
