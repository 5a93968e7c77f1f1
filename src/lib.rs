//! # movie-graph
//!
//! Query and mutation layer over a property graph of movies, people, and the
//! credits that link them (`ACTED_IN`, `DIRECTED`, `PRODUCED`, `WROTE`).
//!
//! ## Features
//!
//! - Fixed Cypher templates per logical operation, with parameters only
//! - Pluggable graph stores (embedded `SQLite`, Neo4j over Bolt)
//! - Idempotent, transactional upsert of movies, people and credits
//! - Two-hop "related movies" traversal and "top actor" ranking
//! - REST transport (`http` feature) and a CLI
//!
//! ## Example
//!
//! ```rust,ignore
//! use movie_graph::services::MovieCatalog;
//! use movie_graph::storage::graph::SqliteGraphStore;
//! use movie_graph::models::AddDataRequest;
//!
//! let catalog = MovieCatalog::new(SqliteGraphStore::in_memory()?);
//! catalog.add_data(&AddDataRequest::new("Inception", 2010)
//!     .with_tagline("Dreams feel real")
//!     .with_credit("Leonardo DiCaprio", "ACTED_IN"))?;
//!
//! let details = catalog.movie_details("Inception")?;
//! assert_eq!(details.people.len(), 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::MovieGraphConfig;
pub use models::{
    AddDataRequest, AddDataResponse, Credit, MovieDetails, MovieRole, RelationshipRole, TopActor,
};
pub use services::MovieCatalog;
pub use storage::{GraphSession, GraphStore};

/// Error type for movie-graph operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Movie title or year missing, year not an integer |
/// | `InvalidRole` | Relationship role outside `ACTED_IN`/`DIRECTED`/`PRODUCED`/`WROTE` |
/// | `NotFound` | Movie details requested for an unknown title |
/// | `OperationFailed` | The graph store failed to connect or execute a statement |
/// | `FeatureNotEnabled` | A store backend was configured but not compiled in |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Required input was missing or malformed.
    ///
    /// Always raised before any statement reaches the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A relationship role outside the closed set was supplied.
    ///
    /// Roles end up in the edge-label position of a query, so they are never
    /// coerced; anything but an exact match is rejected.
    #[error("invalid relationship role: {0:?}")]
    InvalidRole(String),

    /// An exact-match lookup found nothing.
    ///
    /// Only the movie details lookup raises this. List and traversal
    /// operations return an empty result instead.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The lookup key.
        key: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - The store cannot be opened or reached
    /// - A statement fails to execute or a transaction fails to commit
    /// - A result row does not match the statement's row contract
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns `true` if the error was caused by caller input rather than the store.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidRole(_))
    }
}

/// Result type alias for movie-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("movie title is required".to_string());
        assert_eq!(err.to_string(), "invalid input: movie title is required");

        let err = Error::InvalidRole("HACKED".to_string());
        assert_eq!(err.to_string(), "invalid relationship role: \"HACKED\"");

        let err = Error::NotFound {
            entity: "movie",
            key: "Heat".to_string(),
        };
        assert_eq!(err.to_string(), "movie not found: Heat");

        let err = Error::operation("list_movies", "connection refused");
        assert_eq!(
            err.to_string(),
            "operation 'list_movies' failed: connection refused"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(Error::InvalidInput(String::new()).is_caller_error());
        assert!(Error::InvalidRole(String::new()).is_caller_error());
        assert!(!Error::operation("x", "y").is_caller_error());
        assert!(
            !Error::NotFound {
                entity: "movie",
                key: String::new()
            }
            .is_caller_error()
        );
    }
}
