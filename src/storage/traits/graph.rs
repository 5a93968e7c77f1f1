//! Graph store traits.
//!
//! The graph store owns all persisted state. The core talks to it only through
//! [`GraphSession`]s: one session per logical operation, opened with
//! [`GraphStore::session`], used for one or more [`Statement`]s, then
//! committed or dropped.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | `SqliteGraphStore` | Default; embedded | Statements mapped to SQL over three tables |
//! | `Neo4jGraphStore` | `neo4j` feature | Cypher templates run verbatim over Bolt |
//!
//! # Session Guarantees
//!
//! | Exit path | Effect |
//! |-----------|--------|
//! | `commit()` succeeds | All writes of the session are visible |
//! | `commit()` fails | Nothing of the session is visible |
//! | Session dropped | Rolled back and released |
//!
//! Dropping is the only release path needed: early returns through `?` and
//! panics both release the session.

use crate::Result;
use crate::storage::statement::Statement;
use crate::storage::value::Row;
use std::sync::Arc;

/// A scoped unit of work against the graph store.
///
/// Sessions are transactional. Implementations roll back on drop unless
/// [`GraphSession::commit`] has been called.
pub trait GraphSession {
    /// Runs one statement and collects all result rows.
    ///
    /// Rows follow the row contract of the statement's kind (see
    /// [`crate::storage::statement`]). Write statements return no rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to execute the statement.
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>>;

    /// Commits the session and releases it.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the session is rolled back.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Trait for graph store backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn GraphStore>`
/// - Use interior mutability (e.g., `Mutex<Connection>`) or a driver pool for connections
/// - Sessions must not outlive the store; they may borrow from it
/// - `MERGE` semantics must be uniqueness-aware: movie by `title`, person by
///   `name`, credit by (person, movie, role)
pub trait GraphStore: Send + Sync {
    /// Returns a short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Opens a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or a transaction
    /// cannot be started.
    fn session(&self) -> Result<Box<dyn GraphSession + '_>>;
}

impl<S: GraphStore + ?Sized> GraphStore for Arc<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn session(&self) -> Result<Box<dyn GraphSession + '_>> {
        (**self).session()
    }
}

impl<S: GraphStore + ?Sized> GraphStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn session(&self) -> Result<Box<dyn GraphSession + '_>> {
        (**self).session()
    }
}
