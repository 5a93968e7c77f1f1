//! Neo4j graph store.
//!
//! Runs the Cypher templates of [`Statement`] verbatim over Bolt, one explicit
//! transaction per session. The driver is async; the store owns a small
//! tokio runtime and blocks on it so it can sit behind the synchronous
//! [`GraphStore`] trait.
//!
//! Callers inside an async context must reach this store through
//! `tokio::task::spawn_blocking`.

use crate::storage::statement::{Statement, StatementKind};
use crate::storage::traits::graph::{GraphSession, GraphStore};
use crate::storage::value::{Row, StoreValue};
use crate::{Error, Result};
use neo4rs::{BoltMap, BoltType, Graph, Query, Txn, query};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::future::Future;
use tokio::runtime::Runtime;
use tracing::instrument;

/// Uniqueness constraints that make `MERGE` identity-aware.
const SCHEMA_CONSTRAINTS: &[&str] = &[
    "CREATE CONSTRAINT movie_title_unique IF NOT EXISTS FOR (m:Movie) REQUIRE m.title IS UNIQUE",
    "CREATE CONSTRAINT person_name_unique IF NOT EXISTS FOR (p:Person) REQUIRE p.name IS UNIQUE",
];

/// Neo4j-backed graph store.
pub struct Neo4jGraphStore {
    graph: Graph,
    runtime: Runtime,
    uri: String,
}

impl Neo4jGraphStore {
    /// Connects to a Neo4j server and ensures the uniqueness constraints exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created, the server cannot
    /// be reached, or the constraints cannot be created.
    pub fn connect(uri: &str, user: &str, password: &SecretString) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("neo4j-store")
            .enable_all()
            .build()
            .map_err(|e| Error::operation("neo4j_create_runtime", e))?;

        let graph = runtime
            .block_on(Graph::new(uri, user, password.expose_secret()))
            .map_err(|e| Error::operation("neo4j_connect", e))?;

        let store = Self {
            graph,
            runtime,
            uri: uri.to_string(),
        };
        store.ensure_constraints()?;
        tracing::info!(uri = %store.uri, "Connected to Neo4j graph store");
        Ok(store)
    }

    /// Returns the Bolt URI this store is connected to.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn ensure_constraints(&self) -> Result<()> {
        self.block_on(async {
            for constraint in SCHEMA_CONSTRAINTS {
                self.graph
                    .run(query(constraint))
                    .await
                    .map_err(|e| Error::operation("neo4j_create_constraint", e))?;
            }
            Ok(())
        })
    }

    fn block_on<F, T>(&self, f: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.runtime.block_on(f)
    }
}

impl GraphStore for Neo4jGraphStore {
    fn backend_name(&self) -> &'static str {
        "neo4j"
    }

    fn session(&self) -> Result<Box<dyn GraphSession + '_>> {
        let txn = self.block_on(async {
            self.graph
                .start_txn()
                .await
                .map_err(|e| Error::operation("neo4j_begin", e))
        })?;
        Ok(Box::new(Neo4jSession {
            store: self,
            txn: Some(txn),
        }))
    }
}

/// An explicit Neo4j transaction.
struct Neo4jSession<'a> {
    store: &'a Neo4jGraphStore,
    txn: Option<Txn>,
}

impl GraphSession for Neo4jSession<'_> {
    #[instrument(skip(self, statement), fields(kind = %statement.kind()))]
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        let kind = statement.kind();
        let q = bind(statement)?;
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| Error::operation(kind.name(), "session already closed"))?;

        self.store.block_on(async {
            if kind.is_write() {
                txn.run(q).await.map_err(|e| neo4j_error(kind, e))?;
                return Ok(Vec::new());
            }

            let mut stream = txn.execute(q).await.map_err(|e| neo4j_error(kind, e))?;
            let mut rows = Vec::new();
            while let Some(row) = stream
                .next(txn.handle())
                .await
                .map_err(|e| neo4j_error(kind, e))?
            {
                let mut decoded = Row::new();
                for column in kind.columns() {
                    let value: BoltType = row
                        .get(column)
                        .map_err(|e| neo4j_error(kind, format!("column '{column}': {e}")))?;
                    decoded.insert((*column).to_string(), to_store_value(value));
                }
                rows.push(decoded);
            }
            Ok(rows)
        })
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let Some(txn) = self.txn.take() else {
            return Err(Error::operation("neo4j_commit", "session already closed"));
        };
        self.store.block_on(async {
            txn.commit()
                .await
                .map_err(|e| Error::operation("neo4j_commit", e))
        })
    }
}

impl Drop for Neo4jSession<'_> {
    fn drop(&mut self) {
        let Some(txn) = self.txn.take() else {
            return;
        };
        let result = self.store.block_on(async {
            txn.rollback()
                .await
                .map_err(|e| Error::operation("neo4j_rollback", e))
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to roll back Neo4j graph session");
        }
    }
}

/// Builds a driver query from a statement's template and parameters.
fn bind(statement: &Statement) -> Result<Query> {
    let mut q = query(statement.cypher());
    for (name, value) in statement.params() {
        let bolt: BoltType = match value {
            StoreValue::Null => BoltType::Null(neo4rs::BoltNull),
            StoreValue::Bool(b) => (*b).into(),
            StoreValue::Integer(n) => (*n).into(),
            StoreValue::Float(f) => (*f).into(),
            StoreValue::String(s) => s.clone().into(),
            _ => {
                return Err(Error::operation(
                    statement.kind().name(),
                    format!("unsupported parameter type for '{name}'"),
                ));
            },
        };
        q = q.param(name, bolt);
    }
    Ok(q)
}

/// Converts a Bolt value into a [`StoreValue`].
///
/// Temporal and spatial values have no counterpart and are carried as their
/// debug rendering.
fn to_store_value(value: BoltType) -> StoreValue {
    match value {
        BoltType::Null(_) => StoreValue::Null,
        BoltType::Boolean(b) => StoreValue::Bool(b.value),
        BoltType::Integer(n) => StoreValue::Integer(n.value),
        BoltType::Float(f) => StoreValue::Float(f.value),
        BoltType::String(s) => StoreValue::String(s.value),
        BoltType::Bytes(b) => StoreValue::Bytes(b.value.to_vec()),
        BoltType::List(list) => {
            StoreValue::List(list.value.into_iter().map(to_store_value).collect())
        },
        BoltType::Map(map) => StoreValue::Map(to_properties(map)),
        BoltType::Node(node) => StoreValue::Node {
            labels: node
                .labels
                .value
                .into_iter()
                .filter_map(|label| match label {
                    BoltType::String(s) => Some(s.value),
                    _ => None,
                })
                .collect(),
            properties: to_properties(node.properties),
        },
        BoltType::Relation(rel) => StoreValue::Relationship {
            rel_type: rel.typ.value,
            properties: to_properties(rel.properties),
        },
        BoltType::UnboundedRelation(rel) => StoreValue::Relationship {
            rel_type: rel.typ.value,
            properties: to_properties(rel.properties),
        },
        other => StoreValue::String(format!("{other:?}")),
    }
}

fn to_properties(map: BoltMap) -> BTreeMap<String, StoreValue> {
    map.value
        .into_iter()
        .map(|(key, value)| (key.value, to_store_value(value)))
        .collect()
}

fn neo4j_error(kind: StatementKind, e: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: format!("neo4j_{}", kind.name()),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationshipRole;

    #[test]
    fn test_bind_carries_all_params() {
        let statement =
            Statement::merge_credit("Keanu Reeves", "The Matrix", RelationshipRole::ActedIn);
        assert!(bind(&statement).is_ok());
    }

    #[test]
    fn test_node_conversion() {
        let mut properties = BoltMap::new();
        properties.put("title".into(), BoltType::from("The Matrix"));
        properties.put("released".into(), BoltType::from(1999_i64));
        let value = BoltType::Map(properties);

        let StoreValue::Map(converted) = to_store_value(value) else {
            panic!("expected map");
        };
        assert_eq!(converted["title"], StoreValue::String("The Matrix".to_string()));
        assert_eq!(converted["released"], StoreValue::Integer(1999));
    }
}
