//! Editor configuration.

use crate::geometry::{DrawMode, SerializableColor};
use crate::rounding::DEFAULT_EXPORT_STEP;
use crate::snap::{DEFAULT_ASSIST_THRESHOLD, GridMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default record colour per draw mode, as hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeColors {
    pub point: String,
    pub polyline: String,
    pub polygon: String,
}

impl Default for ModeColors {
    fn default() -> Self {
        Self {
            point: "#ef4444".to_string(),
            polyline: "#3b82f6".to_string(),
            polygon: "#22c55e".to_string(),
        }
    }
}

impl ModeColors {
    /// Colour for a mode. Unparseable entries fall back to black.
    pub fn for_mode(&self, mode: DrawMode) -> SerializableColor {
        let hex = match mode {
            DrawMode::None => return SerializableColor::black(),
            DrawMode::Point => &self.point,
            DrawMode::Polyline => &self.polyline,
            DrawMode::Polygon => &self.polygon,
        };
        SerializableColor::from_hex(hex).unwrap_or_else(|| {
            log::warn!("Invalid colour {hex:?} for {mode:?}, using black");
            SerializableColor::black()
        })
    }
}

/// Settings the editor is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// World identifier resolved through the world table.
    pub world: String,
    /// Acting editor written to the audit fields.
    pub editor: String,
    pub grid_mode: GridMode,
    pub assist_threshold: f64,
    pub export_step: f64,
    /// Delay before a pending duplicate check shows its spinner.
    pub spinner_delay_ms: u64,
    pub colors: ModeColors,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            world: "zth".to_string(),
            editor: String::new(),
            grid_mode: GridMode::Off,
            assist_threshold: DEFAULT_ASSIST_THRESHOLD,
            export_step: DEFAULT_EXPORT_STEP,
            spinner_delay_ms: 1000,
            colors: ModeColors::default(),
        }
    }
}

impl EditorConfig {
    /// Parse configuration JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Load from a file, using defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Default config file location.
    ///
    /// On Unix: `~/.local/share/geodraft/config.json`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        let base = dirs::data_local_dir().or_else(dirs::home_dir)?;
        Some(base.join("geodraft").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_keys_use_defaults() {
        let json = r#"{"editor": "alice", "grid_mode": "edge"}"#;
        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.editor, "alice");
        assert_eq!(config.grid_mode, GridMode::Edge);
        assert_eq!(config.world, "zth");
        assert_eq!(config.export_step, 0.1);
        assert_eq!(config.spinner_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            EditorConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{"grid_mode": "diagonal"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(EditorConfig::load_or_default(&path).unwrap(), EditorConfig::default());
        assert!(matches!(EditorConfig::load(&path), Err(ConfigError::Io(_))));

        let mut config = EditorConfig::default();
        config.world = "eden".to_string();
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_mode_colors() {
        let mut colors = ModeColors::default();
        assert_eq!(colors.for_mode(DrawMode::Point), SerializableColor::new(0xef, 0x44, 0x44, 255));
        colors.polygon = "green".to_string();
        assert_eq!(colors.for_mode(DrawMode::Polygon), SerializableColor::black());
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = EditorConfig::default_path() {
            assert!(path.ends_with("geodraft/config.json"));
        }
    }
}
