//! Logging configuration primitives.

use std::path::PathBuf;

use crate::config::ObservabilitySettings;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for terminals.
    #[default]
    Pretty,
    /// Newline-delimited JSON for log collectors.
    Json,
}

impl LogFormat {
    /// Parses a format token, case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Event format.
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Log file path; `None` writes to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "codetrack=info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds a logging configuration from the optional config file section.
    ///
    /// `verbose` comes from the CLI and wins over the configured filter.
    #[must_use]
    pub fn from_settings(settings: Option<&ObservabilitySettings>, verbose: bool) -> Self {
        let mut config = Self::default();

        if let Some(settings) = settings {
            if let Some(format) = settings.format.as_deref().and_then(LogFormat::parse) {
                config.format = format;
            }
            if let Some(filter) = &settings.filter {
                config.filter.clone_from(filter);
            }
            if let Some(file) = &settings.file {
                config.file = Some(PathBuf::from(file));
            }
        }

        if verbose {
            config.filter = "codetrack=debug".to_string();
        }

        config
    }

    /// Sets the log file path.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}
