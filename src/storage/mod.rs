//! Storage layer abstraction.
//!
//! This module provides the graph store seam:
//! - **Statements**: fixed Cypher templates plus named parameters
//! - **Values**: store-native values and their normalization to JSON
//! - **Backends**: embedded `SQLite` and Neo4j (`neo4j` feature)

// Allow significant_drop_tightening - sessions hold their connection guard on purpose.
#![allow(clippy::significant_drop_tightening)]
// Allow match_same_arms for explicit enum handling.
#![allow(clippy::match_same_arms)]

pub mod graph;
pub mod statement;
pub mod traits;
pub mod value;

pub use statement::{Statement, StatementKind};
pub use traits::{GraphSession, GraphStore};
pub use value::{Row, StoreValue, normalize, normalize_row};
