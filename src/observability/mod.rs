//! Observability and telemetry.
//!
//! Logging goes through `tracing`; metrics through the `metrics` facade with
//! an optional Prometheus exporter. [`init`] installs both once per process.

mod logging;
mod metrics;
mod request_context;

pub use logging::{LOG_FILTER_ENV, LogFormat, LoggingConfig};
pub use metrics::{
    MetricsConfig, MetricsHandle, OPERATION_DURATION_MS, OPERATIONS_TOTAL, install_prometheus,
    record_operation,
};
pub use request_context::{
    REQUEST_ID_HEADER, RequestContext, RequestContextGuard, current_request_context,
    current_request_id, enter_request_context, scope_request_context,
};

use crate::config::MovieGraphConfig;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Full observability configuration.
#[derive(Debug)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
    /// Whether to expose metrics via HTTP listener.
    pub metrics_expose: bool,
}

/// Options for initialization.
#[derive(Debug, Clone, Copy)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
    /// Whether to expose metrics via HTTP listener.
    pub metrics_expose: bool,
}

/// Handle for observability runtime components.
pub struct ObservabilityHandle {
    metrics_handle: Option<MetricsHandle>,
}

impl ObservabilityHandle {
    /// Returns the metrics handle when a recorder was installed.
    #[must_use]
    pub const fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics_handle.as_ref()
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes observability from resolved configuration.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// telemetry components fail to initialize.
pub fn init_from_config(
    config: &MovieGraphConfig,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    init(ObservabilityConfig {
        logging: LoggingConfig::from_settings(&config.logging, options.verbose),
        metrics: MetricsConfig::from_settings(&config.metrics),
        metrics_expose: options.metrics_expose,
    })
}

/// Initializes logging and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// telemetry components fail to initialize.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::operation(
            "observability_init",
            "observability already initialized",
        ));
    }

    let metrics_handle = install_prometheus(&config.metrics, config.metrics_expose)?;

    // Initialize logging based on format and optional file output
    match (&config.logging.file, config.logging.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(config.logging.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(config.logging.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(config.logging.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_target(true),
                )
                .with(config.logging.filter)
                .try_init()
                .map_err(init_error)?;
        },
    }

    OBSERVABILITY_INIT.set(()).map_err(|()| {
        Error::operation(
            "observability_init",
            "failed to mark observability initialized",
        )
    })?;

    Ok(ObservabilityHandle { metrics_handle })
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_log_dir", e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::operation("open_log_file", format!("{}: {}", path.display(), e)))?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

/// Helper to convert init errors.
#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::operation("observability_init", e)
}
