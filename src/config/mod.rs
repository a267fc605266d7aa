//! Configuration management.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::awareness::{AwarenessConfig, ThresholdSet};
use crate::io::Format;
use crate::models::Mode;

/// Main configuration for codetrack.
#[derive(Debug, Clone)]
pub struct CodetrackConfig {
    /// Path of the JSON snapshot the store loads from and saves to.
    pub snapshot_path: PathBuf,
    /// Defaults applied when an export names no format or mode.
    pub export: ExportDefaults,
    /// Awareness scoring inputs.
    pub awareness: AwarenessConfig,
    /// Observability settings, consumed at logging init.
    pub observability: Option<ObservabilitySettings>,
}

/// Default format and mode for exports.
#[derive(Debug, Clone, Copy)]
pub struct ExportDefaults {
    /// Serialization format.
    pub format: Format,
    /// Field projection.
    pub mode: Mode,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: Format::Json,
            mode: Mode::Full,
        }
    }
}

/// Observability section, all optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilitySettings {
    /// Log format: `pretty` or `json`.
    pub format: Option<String>,
    /// Log filter directive, e.g. `codetrack=debug`.
    pub filter: Option<String>,
    /// Log file path; absent logs to stderr.
    pub file: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data section.
    pub data: Option<DataSection>,
    /// Export defaults section.
    pub export: Option<ExportSection>,
    /// Awareness section.
    pub awareness: Option<AwarenessSection>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// Data section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct DataSection {
    /// Snapshot file path.
    pub snapshot_path: Option<String>,
}

/// Export section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ExportSection {
    /// Default format token.
    pub format: Option<String>,
    /// Default mode token.
    pub mode: Option<String>,
}

/// Awareness section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct AwarenessSection {
    /// Target problems per day.
    pub problems_per_day: Option<f64>,
    /// Score points per elapsed day.
    pub base_rate: Option<f64>,
    /// Solved-factor scaling applied to every tier.
    pub base_solved_scaling: Option<f64>,
    /// Band thresholds.
    pub thresholds: Option<ThresholdSection>,
}

/// Thresholds table in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ThresholdSection {
    /// White band bound.
    pub white: Option<u32>,
    /// Green band bound.
    pub green: Option<u32>,
    /// Yellow band bound.
    pub yellow: Option<u32>,
    /// Red band bound.
    pub red: Option<u32>,
    /// Dark-red band bound.
    pub dark_red: Option<u32>,
}

impl Default for CodetrackConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            export: ExportDefaults::default(),
            awareness: AwarenessConfig::default(),
            observability: None,
        }
    }
}

impl CodetrackConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following in order:
    /// 1. `CODETRACK_CONFIG_PATH` environment variable
    /// 2. Platform config dir (`~/Library/Application Support/codetrack/` on macOS)
    /// 3. XDG config dir (`~/.config/codetrack/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("CODETRACK_CONFIG_PATH") {
            if !path.is_empty() {
                if let Ok(config) = Self::load_from_file(Path::new(&path)) {
                    return config;
                }
            }
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        // Check platform-specific config dir first
        let platform_config = base_dirs
            .config_dir()
            .join("codetrack")
            .join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        // Fall back to XDG-style ~/.config/codetrack/ for Unix compatibility
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("codetrack")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `CodetrackConfig`.
    ///
    /// Unknown format and mode tokens fall back to the defaults rather
    /// than failing the load. Thresholds normalize to a strictly
    /// increasing sequence after the merge.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data) = file.data {
            if let Some(path) = data.snapshot_path {
                config.snapshot_path = PathBuf::from(path);
            }
        }
        if let Some(export) = file.export {
            if let Some(format) = export.format {
                config.export.format =
                    Format::from_extension(&format).unwrap_or(config.export.format);
            }
            if let Some(mode) = export.mode {
                config.export.mode = Mode::parse(&mode).unwrap_or(config.export.mode);
            }
        }
        if let Some(awareness) = file.awareness {
            if let Some(rate) = awareness.problems_per_day {
                config.awareness.problems_per_day = rate;
            }
            if let Some(rate) = awareness.base_rate {
                config.awareness.base_rate = rate;
            }
            if let Some(scaling) = awareness.base_solved_scaling {
                config.awareness.base_solved_scaling = scaling;
            }
            if let Some(section) = awareness.thresholds {
                let defaults = ThresholdSet::default();
                config.awareness.thresholds = ThresholdSet {
                    white: section.white.unwrap_or(defaults.white),
                    green: section.green.unwrap_or(defaults.green),
                    yellow: section.yellow.unwrap_or(defaults.yellow),
                    red: section.red.unwrap_or(defaults.red),
                    dark_red: section.dark_red.unwrap_or(defaults.dark_red),
                };
            }
            config.awareness.thresholds = config.awareness.thresholds.normalized();
        }
        config.observability = file.observability;

        config
    }

    /// Sets the snapshot path.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }
}

/// Platform data location for the store snapshot.
fn default_snapshot_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".codetrack").join("snapshot.json"),
        |dirs| dirs.data_dir().join("codetrack").join("snapshot.json"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            [data]
            snapshot_path = "/tmp/tracker.json"

            [export]
            format = "yaml"

            [awareness]
            problems_per_day = 4.0
            "#,
        )
        .unwrap();
        let config = CodetrackConfig::from_config_file(file);

        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/tracker.json"));
        assert_eq!(config.export.format, Format::Yaml);
        assert_eq!(config.export.mode, Mode::Full);
        assert!((config.awareness.problems_per_day - 4.0).abs() < f64::EPSILON);
        assert!((config.awareness.base_rate - 2.0).abs() < f64::EPSILON);
        assert!(config.observability.is_none());
    }

    #[test]
    fn test_unknown_tokens_fall_back() {
        let file: ConfigFile = toml::from_str(
            r#"
            [export]
            format = "parquet"
            mode = "sideways"
            "#,
        )
        .unwrap();
        let config = CodetrackConfig::from_config_file(file);

        assert_eq!(config.export.format, Format::Json);
        assert_eq!(config.export.mode, Mode::Full);
    }

    #[test]
    fn test_thresholds_merge_and_normalize() {
        let file: ConfigFile = toml::from_str(
            r#"
            [awareness.thresholds]
            white = 50
            green = 30
            yellow = 20
            "#,
        )
        .unwrap();
        let config = CodetrackConfig::from_config_file(file);

        let thresholds = config.awareness.thresholds;
        assert_eq!(thresholds.white, 50);
        assert_eq!(thresholds.green, 51);
        assert_eq!(thresholds.yellow, 52);
        // Unset bands keep their defaults before normalization.
        assert_eq!(thresholds.red, 70);
        assert_eq!(thresholds.dark_red, 90);
    }

    #[test]
    fn test_observability_section_carries_through() {
        let file: ConfigFile = toml::from_str(
            r#"
            [observability]
            format = "json"
            filter = "codetrack=debug"
            file = "/var/log/codetrack.log"
            "#,
        )
        .unwrap();
        let config = CodetrackConfig::from_config_file(file);

        let observability = config.observability.unwrap();
        assert_eq!(observability.format.as_deref(), Some("json"));
        assert_eq!(observability.filter.as_deref(), Some("codetrack=debug"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CodetrackConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, crate::Error::OperationFailed { .. }));
    }
}
