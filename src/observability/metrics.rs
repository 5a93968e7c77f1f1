//! Prometheus metrics.
//!
//! Every catalog operation records:
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `movie_graph_operations_total` | counter | `operation`, `status` |
//! | `movie_graph_operation_duration_ms` | histogram | `operation` |
//!
//! Without an installed recorder these calls are no-ops.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_exporter_prometheus::PrometheusHandle;
use metrics_exporter_prometheus::PrometheusRecorder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;

/// Counter of catalog operations.
pub const OPERATIONS_TOTAL: &str = "movie_graph_operations_total";
/// Histogram of catalog operation latency.
pub const OPERATION_DURATION_MS: &str = "movie_graph_operation_duration_ms";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Address to bind the metrics exporter.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings.
    ///
    /// Metrics are enabled exactly when a Prometheus port is configured.
    #[must_use]
    pub fn from_settings(settings: &MetricsSettings) -> Self {
        let port = settings.prometheus_port.unwrap_or(9090);
        Self {
            enabled: settings.prometheus_port.is_some(),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }
}

/// Metrics handle kept alive for the lifetime of the process.
#[derive(Debug)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
}

impl MetricsHandle {
    /// Renders the current metrics in the Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Records the outcome and latency of one catalog operation.
pub fn record_operation(operation: &'static str, success: bool, duration_ms: f64) {
    let status = if success { "success" } else { "error" };
    metrics::counter!(OPERATIONS_TOTAL, "operation" => operation, "status" => status)
        .increment(1);
    metrics::histogram!(OPERATION_DURATION_MS, "operation" => operation).record(duration_ms);
}

/// Installs the Prometheus metrics recorder and, if `expose`, its HTTP listener.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed or the
/// listener cannot be started.
pub fn install_prometheus(config: &MetricsConfig, expose: bool) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let builder = PrometheusBuilder::new();
    let prometheus = if expose {
        let builder = builder.with_http_listener(config.listen_addr);
        install_listener(builder)?
    } else {
        builder
            .install_recorder()
            .map_err(|e| Error::operation("metrics_recorder_install", e))?
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        exposed = expose,
        "Installed Prometheus metrics recorder"
    );
    Ok(Some(MetricsHandle { prometheus }))
}

/// Installs the exporter on the current runtime, or on a dedicated thread
/// when called outside one.
fn install_listener(builder: PrometheusBuilder) -> Result<PrometheusHandle> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        return install_with_runtime(builder, &handle);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::operation("metrics_runtime_init", e))?;
    let handle = runtime.handle().clone();
    let prometheus = install_with_runtime(builder, &handle)?;
    thread::Builder::new()
        .name("metrics-exporter-prometheus-http".to_string())
        .spawn(move || runtime.block_on(std::future::pending::<()>()))
        .map_err(|e| Error::operation("metrics_runtime_thread", e))?;
    Ok(prometheus)
}

fn install_with_runtime(
    builder: PrometheusBuilder,
    runtime_handle: &tokio::runtime::Handle,
) -> Result<PrometheusHandle> {
    let (recorder, exporter) = {
        let _guard = runtime_handle.enter();
        builder
            .build()
            .map_err(|e| Error::operation("metrics_exporter_build", e))?
    };
    let handle = recorder.handle();
    set_global_recorder(recorder)?;
    runtime_handle.spawn(exporter);
    Ok(handle)
}

fn set_global_recorder(recorder: PrometheusRecorder) -> Result<()> {
    metrics::set_global_recorder(recorder).map_err(|e| Error::operation("metrics_recorder_install", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_port() {
        let config = MetricsConfig::from_settings(&MetricsSettings::default());
        assert!(!config.enabled);
        assert!(install_prometheus(&config, true).unwrap().is_none());
    }

    #[test]
    fn test_enabled_with_port() {
        let config = MetricsConfig::from_settings(&MetricsSettings {
            prometheus_port: Some(9464),
        });
        assert!(config.enabled);
        assert_eq!(config.listen_addr.port(), 9464);
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_operation("list_movies", true, 1.5);
        record_operation("list_movies", false, 0.0);
    }
}
