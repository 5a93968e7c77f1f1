//! Backend factory for graph store initialization.
//!
//! Centralizes store creation so the CLI, the HTTP server and tests open
//! stores the same way.
//!
//! # Architecture
//!
//! ```text
//! BackendFactory
//!   ├── create_graph_store(&StoreConfig) → Arc<dyn GraphStore>
//!   ├── create_sqlite_store(&Path)       → SqliteGraphStore
//!   └── create_neo4j_store(&Neo4jConfig) → Neo4jGraphStore (feature `neo4j`)
//! ```
//!
//! Unlike optional subsystems, the graph store is required: failures are
//! returned, never degraded to `None`.

use crate::Result;
use crate::config::{Neo4jConfig, StoreBackend, StoreConfig};
use crate::storage::GraphStore;
use crate::storage::graph::SqliteGraphStore;
use std::path::Path;
use std::sync::Arc;

/// Factory for creating graph stores.
///
/// # Example
///
/// ```rust,ignore
/// use movie_graph::services::{BackendFactory, MovieCatalog};
/// use movie_graph::MovieGraphConfig;
///
/// let config = MovieGraphConfig::load_default();
/// let store = BackendFactory::create_graph_store(&config.store)?;
/// let catalog = MovieCatalog::new(store);
/// ```
pub struct BackendFactory;

impl BackendFactory {
    /// Creates the configured graph store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FeatureNotEnabled`] if the configured backend was not
    /// compiled in, or an error if the store cannot be opened.
    pub fn create_graph_store(config: &StoreConfig) -> Result<Arc<dyn GraphStore>> {
        match config.backend {
            StoreBackend::Sqlite => {
                let store = Self::create_sqlite_store(&config.sqlite_path)?;
                Ok(Arc::new(store))
            },
            StoreBackend::Neo4j => Self::create_neo4j_store(&config.neo4j),
        }
    }

    /// Creates the `SQLite` graph store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn create_sqlite_store(path: &Path) -> Result<SqliteGraphStore> {
        match SqliteGraphStore::new(path) {
            Ok(store) => {
                tracing::debug!(path = %path.display(), "Created SQLite graph store");
                Ok(store)
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to create SQLite graph store"
                );
                Err(e)
            },
        }
    }

    /// Creates the Neo4j graph store.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    #[cfg(feature = "neo4j")]
    pub fn create_neo4j_store(config: &Neo4jConfig) -> Result<Arc<dyn GraphStore>> {
        use crate::storage::graph::Neo4jGraphStore;

        match Neo4jGraphStore::connect(&config.uri, &config.user, &config.password) {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) => {
                tracing::warn!(uri = %config.uri, error = %e, "Failed to connect to Neo4j");
                Err(e)
            },
        }
    }

    /// Creates the Neo4j graph store.
    ///
    /// # Errors
    ///
    /// Always returns [`crate::Error::FeatureNotEnabled`]; the `neo4j` feature is off.
    #[cfg(not(feature = "neo4j"))]
    pub fn create_neo4j_store(config: &Neo4jConfig) -> Result<Arc<dyn GraphStore>> {
        tracing::warn!(uri = %config.uri, "Neo4j backend requested but not compiled in");
        Err(crate::Error::FeatureNotEnabled("neo4j".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovieGraphConfig;

    #[test]
    fn test_create_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = MovieGraphConfig::new().with_sqlite_path(dir.path().join("graph.db"));

        let store = BackendFactory::create_graph_store(&config.store).unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(dir.path().join("graph.db").exists());
    }

    #[cfg(not(feature = "neo4j"))]
    #[test]
    fn test_neo4j_without_feature() {
        let config = MovieGraphConfig::new().with_backend(StoreBackend::Neo4j);
        let result = BackendFactory::create_graph_store(&config.store);
        assert!(matches!(result, Err(crate::Error::FeatureNotEnabled(f)) if f == "neo4j"));
    }
}
