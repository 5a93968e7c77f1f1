//! Configuration management.
//!
//! Configuration is resolved in layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>` or the platform config dir)
//! 3. `.env` file in the working directory (loaded into the environment)
//! 4. `MOVIE_GRAPH_*` environment variables
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MOVIE_GRAPH_BACKEND` | `store.backend` (`sqlite` or `neo4j`) |
//! | `MOVIE_GRAPH_SQLITE_PATH` | `store.sqlite_path` |
//! | `MOVIE_GRAPH_NEO4J_URI` | `store.neo4j.uri` |
//! | `MOVIE_GRAPH_NEO4J_USER` | `store.neo4j.user` |
//! | `MOVIE_GRAPH_NEO4J_PASSWORD` | `store.neo4j.password` |
//! | `MOVIE_GRAPH_HOST` | `server.host` |
//! | `MOVIE_GRAPH_PORT` | `server.port` |
//! | `MOVIE_GRAPH_CORS_ORIGIN` | `server.cors_origin` |
//! | `MOVIE_GRAPH_LOG_FORMAT` | `logging.format` (`pretty` or `json`) |
//! | `MOVIE_GRAPH_METRICS_PORT` | `metrics.prometheus_port` |

use crate::observability::LogFormat;
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name used under the platform config and data dirs.
const APP_DIR: &str = "movie-graph";

/// Main configuration for movie-graph.
#[derive(Debug, Clone, Default)]
pub struct MovieGraphConfig {
    /// Graph store selection and connection settings.
    pub store: StoreConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
}

/// Available graph store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Embedded `SQLite` database.
    #[default]
    Sqlite,
    /// Neo4j server over Bolt.
    Neo4j,
}

impl StoreBackend {
    /// Parses a backend name, falling back to `SQLite` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "neo4j" | "bolt" => Self::Neo4j,
            _ => Self::Sqlite,
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Neo4j => "neo4j",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which backend to open.
    pub backend: StoreBackend,
    /// Database file for the `SQLite` backend.
    pub sqlite_path: PathBuf,
    /// Connection settings for the Neo4j backend.
    pub neo4j: Neo4jConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
            neo4j: Neo4jConfig::default(),
        }
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt URI.
    pub uri: String,
    /// User name.
    pub user: String,
    /// Password.
    pub password: SecretString,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: SecretString::from(String::new()),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origin allowed by CORS.
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Default filter directive when `MOVIE_GRAPH_LOG`/`RUST_LOG` are unset.
    pub level: String,
    /// Optional log file; logs go to stderr otherwise.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSettings {
    /// Port of the Prometheus scrape listener; disabled when `None`.
    pub prometheus_port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Store section.
    pub store: Option<ConfigFileStore>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileStore {
    /// Backend name.
    pub backend: Option<String>,
    /// `SQLite` database path.
    pub sqlite_path: Option<String>,
    /// Neo4j Bolt URI.
    pub neo4j_uri: Option<String>,
    /// Neo4j user.
    pub neo4j_user: Option<String>,
    /// Neo4j password.
    pub neo4j_password: Option<SecretString>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileServer {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// CORS origin.
    pub cors_origin: Option<String>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Default filter directive.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileMetrics {
    /// Prometheus listener port.
    pub prometheus_port: Option<u16>,
}

impl MovieGraphConfig {
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

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/.config/movie-graph/config.toml` on Linux)
    /// 2. XDG config dir (`~/.config/movie-graph/`) for macOS users who prefer it
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join(APP_DIR).join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join(APP_DIR)
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Resolves the full configuration: file, `.env`, then environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given config file cannot be loaded.
    pub fn resolve(explicit_path: Option<&Path>) -> crate::Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let config = match explicit_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `MOVIE_GRAPH_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `MOVIE_GRAPH_*` overrides from an arbitrary lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MOVIE_GRAPH_BACKEND") {
            self.store.backend = StoreBackend::parse(&v);
        }
        if let Some(v) = get("MOVIE_GRAPH_SQLITE_PATH") {
            self.store.sqlite_path = PathBuf::from(v);
        }
        if let Some(v) = get("MOVIE_GRAPH_NEO4J_URI") {
            self.store.neo4j.uri = v;
        }
        if let Some(v) = get("MOVIE_GRAPH_NEO4J_USER") {
            self.store.neo4j.user = v;
        }
        if let Some(v) = get("MOVIE_GRAPH_NEO4J_PASSWORD") {
            self.store.neo4j.password = SecretString::from(v);
        }
        if let Some(v) = get("MOVIE_GRAPH_HOST") {
            self.server.host = v;
        }
        if let Some(port) = get("MOVIE_GRAPH_PORT").and_then(|v| parse_port("MOVIE_GRAPH_PORT", &v))
        {
            self.server.port = port;
        }
        if let Some(v) = get("MOVIE_GRAPH_CORS_ORIGIN") {
            self.server.cors_origin = v;
        }
        if let Some(v) = get("MOVIE_GRAPH_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&v);
        }
        if let Some(port) = get("MOVIE_GRAPH_METRICS_PORT")
            .and_then(|v| parse_port("MOVIE_GRAPH_METRICS_PORT", &v))
        {
            self.metrics.prometheus_port = Some(port);
        }

        self
    }

    /// Converts a `ConfigFile` to `MovieGraphConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(store) = file.store {
            if let Some(backend) = store.backend {
                config.store.backend = StoreBackend::parse(&backend);
            }
            if let Some(path) = store.sqlite_path {
                config.store.sqlite_path = PathBuf::from(path);
            }
            if let Some(uri) = store.neo4j_uri {
                config.store.neo4j.uri = uri;
            }
            if let Some(user) = store.neo4j_user {
                config.store.neo4j.user = user;
            }
            if let Some(password) = store.neo4j_password {
                config.store.neo4j.password = password;
            }
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(origin) = server.cors_origin {
                config.server.cors_origin = origin;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            config.metrics.prometheus_port = metrics.prometheus_port;
        }

        config
    }

    /// Sets the graph store backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.store.backend = backend;
        self
    }

    /// Sets the `SQLite` database path.
    #[must_use]
    pub fn with_sqlite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.sqlite_path = path.into();
        self
    }
}

fn parse_port(key: &str, value: &str) -> Option<u16> {
    match value.trim().parse() {
        Ok(port) => Some(port),
        Err(e) => {
            tracing::warn!(key, value, error = %e, "Ignoring invalid port override");
            None
        },
    }
}

/// Default `SQLite` path: the platform data dir, or `./movies.db`.
fn default_sqlite_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("movies.db"),
        |dirs| dirs.data_local_dir().join(APP_DIR).join("movies.db"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = MovieGraphConfig::new();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.cors_origin, "http://localhost:3000");
        assert_eq!(config.store.neo4j.uri, "bolt://localhost:7687");
        assert!(config.metrics.prometheus_port.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let config = MovieGraphConfig::from_toml(
            r#"
            [store]
            backend = "neo4j"
            sqlite_path = "/tmp/movies.db"
            neo4j_uri = "bolt://graph:7687"
            neo4j_user = "admin"
            neo4j_password = "s3cret"

            [server]
            host = "0.0.0.0"
            port = 8080
            cors_origin = "https://movies.example"

            [logging]
            format = "json"
            level = "debug"

            [metrics]
            prometheus_port = 9090
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Neo4j);
        assert_eq!(config.store.sqlite_path, PathBuf::from("/tmp/movies.db"));
        assert_eq!(config.store.neo4j.uri, "bolt://graph:7687");
        assert_eq!(config.store.neo4j.user, "admin");
        assert_eq!(config.store.neo4j.password.expose_secret(), "s3cret");
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.cors_origin, "https://movies.example");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.metrics.prometheus_port, Some(9090));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MovieGraphConfig::from_toml("[server]\nport = 7000\n").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = MovieGraphConfig::from_toml("[server]\nprot = 7000\n");
        assert!(matches!(
            result,
            Err(crate::Error::OperationFailed { ref operation, .. }) if operation == "parse_config_file"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nbackend = \"sqlite\"\nsqlite_path = \"graph.db\"\n").unwrap();

        let config = MovieGraphConfig::load_from_file(&path).unwrap();
        assert_eq!(config.store.sqlite_path, PathBuf::from("graph.db"));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = MovieGraphConfig::load_from_file(Path::new("/nonexistent/movie-graph.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MOVIE_GRAPH_BACKEND", "neo4j"),
            ("MOVIE_GRAPH_NEO4J_PASSWORD", "from-env"),
            ("MOVIE_GRAPH_PORT", "6000"),
            ("MOVIE_GRAPH_METRICS_PORT", "9100"),
            ("MOVIE_GRAPH_LOG_FORMAT", "json"),
            ("MOVIE_GRAPH_HOST", "   "),
        ]
        .into_iter()
        .collect();

        let config = MovieGraphConfig::new()
            .with_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.store.backend, StoreBackend::Neo4j);
        assert_eq!(config.store.neo4j.password.expose_secret(), "from-env");
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.metrics.prometheus_port, Some(9100));
        assert_eq!(config.logging.format, LogFormat::Json);
        // Blank values do not override.
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let config = MovieGraphConfig::new().with_overrides(|key| {
            (key == "MOVIE_GRAPH_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("Neo4j"), StoreBackend::Neo4j);
        assert_eq!(StoreBackend::parse("sqlite"), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::parse("unknown"), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::Neo4j.to_string(), "neo4j");
    }
}
