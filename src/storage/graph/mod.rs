//! Graph store backends.
//!
//! # Available Backends
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | [`SqliteGraphStore`] | Default; embedded | Statements mapped to SQL over three tables |
//! | `Neo4jGraphStore` | `neo4j` feature | Cypher templates sent verbatim over Bolt |
//!
//! # Example
//!
//! ```rust,ignore
//! use movie_graph::storage::graph::SqliteGraphStore;
//! use movie_graph::storage::{GraphStore, Statement};
//!
//! let store = SqliteGraphStore::new("movies.db")?;
//! let mut session = store.session()?;
//! let rows = session.run(&Statement::list_movies())?;
//! ```

#[cfg(feature = "neo4j")]
mod neo4j;
mod sqlite;

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;
pub use sqlite::SqliteGraphStore;

// Re-export traits for convenience
pub use crate::storage::traits::graph::{GraphSession, GraphStore};
