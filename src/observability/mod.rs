//! Observability for the codetrack CLI and library.
//!
//! All diagnostics go through `tracing`. [`init`] installs a global
//! subscriber once per process, shaped by [`LoggingConfig`]:
//!
//! - Pretty or JSON event formatting
//! - Output to stderr or an append-mode log file
//! - Filter directives from `RUST_LOG`, the config file, or `--verbose`
//!
//! Library code only emits events and spans; it never installs a
//! subscriber, so embedders keep control of their own logging setup.

mod logging;

pub use logging::{LogFormat, LoggingConfig};

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::ObservabilitySettings;
use crate::{Error, Result};

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes the global tracing subscriber.
///
/// Idempotent: the first call installs the subscriber, later calls are
/// no-ops. `RUST_LOG` overrides the configured filter when set.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if the filter directive is malformed, the log file
/// cannot be opened, or another subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: e.to_string(),
        })?;

    match (&config.file, config.format) {
        (Some(path), LogFormat::Json) => {
            let writer = LogFileWriter::open(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        }
        (Some(path), LogFormat::Pretty) => {
            let writer = LogFileWriter::open(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        }
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        }
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        }
    }

    let _ = OBSERVABILITY_INIT.set(());
    Ok(())
}

/// Initializes logging from the optional config file section.
///
/// # Errors
///
/// Same failure conditions as [`init`].
pub fn init_from_config(settings: Option<&ObservabilitySettings>, verbose: bool) -> Result<()> {
    init(&LoggingConfig::from_settings(settings, verbose))
}

/// Append-mode log file writer shared across subscriber workers.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl LogFileWriter {
    fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                    operation: "open_log_file".to_string(),
                    cause: format!("{}: {}", parent.display(), e),
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::OperationFailed {
                operation: "open_log_file".to_string(),
                cause: format!("{}: {}", path.display(), e),
            })?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}
