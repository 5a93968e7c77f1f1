//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "MOVIE_GRAPH_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to pretty output.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from settings.
    ///
    /// The filter comes from `MOVIE_GRAPH_LOG`, then `RUST_LOG`, then the
    /// configured level (`debug` when `verbose`).
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let fallback = if verbose {
            "debug"
        } else {
            settings.level.as_str()
        };
        let directive = std::env::var(LOG_FILTER_ENV)
            .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
            .unwrap_or_else(|_| fallback.to_string());

        Self {
            filter: build_filter(&directive, fallback),
            format: settings.format,
            file: settings.file.clone(),
        }
    }
}

/// Parses a filter directive, falling back when it is malformed.
fn build_filter(directive: &str, fallback: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(fallback))
}
