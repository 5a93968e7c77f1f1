//! `SQLite` graph store.
//!
//! Embeds the movie graph in three tables and maps every [`StatementKind`]
//! onto an equivalent SQL query, producing rows that honour the statement's
//! row contract. Sessions are `SQLite` transactions.

// Allow significant_drop_tightening - the connection guard is the session itself.
#![allow(clippy::significant_drop_tightening)]

use crate::models::RelationshipRole;
use crate::storage::statement::{
    PARAM_NAME, PARAM_RELEASED, PARAM_TAGLINE, PARAM_TITLE, Statement, StatementKind,
};
use crate::storage::traits::graph::{GraphSession, GraphStore};
use crate::storage::value::{Row, StoreValue};
use crate::{Error, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// Helper to acquire mutex lock with poison recovery.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Graph SQLite mutex was poisoned, recovering");
            metrics::counter!("graph_sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

const ACTOR_FILMOGRAPHY_SQL: &str = "SELECT movie_title AS title FROM graph_credits
     WHERE person_name = ?1 AND role = ?2
     ORDER BY movie_title";

const DIRECTOR_PRODUCER_SQL: &str = "SELECT movie_title AS title, role FROM graph_credits
     WHERE person_name = ?1 AND role IN (?2, ?3)
     ORDER BY movie_title, role";

const RELATED_MOVIES_SQL: &str = "SELECT DISTINCT hop2.movie_title AS title, hop2.role AS role
     FROM graph_credits hop1
     JOIN graph_credits hop2 ON hop2.person_name = hop1.person_name
     WHERE hop1.movie_title = ?1
       AND hop1.role IN (?2, ?3)
       AND hop2.role IN (?2, ?3)
       AND hop2.movie_title <> ?1
     ORDER BY hop2.movie_title, hop2.role";

const TOP_ACTOR_SQL: &str = "SELECT person_name AS name, COUNT(DISTINCT movie_title) AS movie_count
     FROM graph_credits
     WHERE role = ?1
     GROUP BY person_name
     ORDER BY movie_count DESC, person_name ASC
     LIMIT 1";

/// `SQLite`-based graph store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>`; a session holds the lock for its whole
/// lifetime, so sessions are serialized. WAL mode and `busy_timeout` handle
/// other processes sharing the file. A thread must not open a second session
/// while it still holds one.
///
/// # Schema
///
/// - `graph_movies`: movie nodes keyed by `title`
/// - `graph_people`: person nodes keyed by `name`
/// - `graph_credits`: credit edges keyed by (person, movie, role)
pub struct SqliteGraphStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteGraphStore {
    /// Opens (creating if needed) a file-backed graph store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::operation("create_graph_sqlite_dir", e))?;
        }
        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "open_graph_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory graph store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_graph_sqlite_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };

        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Initializes the database schema.
    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");
        let _ = conn.pragma_update(None, "foreign_keys", "ON");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS graph_movies (
                title TEXT PRIMARY KEY,
                released INTEGER,
                tagline TEXT
            );
            CREATE TABLE IF NOT EXISTS graph_people (
                name TEXT PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS graph_credits (
                person_name TEXT NOT NULL,
                movie_title TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('ACTED_IN', 'DIRECTED', 'PRODUCED', 'WROTE')),
                PRIMARY KEY (person_name, movie_title, role),
                FOREIGN KEY (person_name) REFERENCES graph_people(name),
                FOREIGN KEY (movie_title) REFERENCES graph_movies(title)
            );
            CREATE INDEX IF NOT EXISTS idx_graph_credits_movie ON graph_credits(movie_title);
            CREATE INDEX IF NOT EXISTS idx_graph_credits_role ON graph_credits(role);",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "create_graph_tables".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }
}

impl GraphStore for SqliteGraphStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn session(&self) -> Result<Box<dyn GraphSession + '_>> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch("BEGIN")
            .map_err(|e| Error::operation("sqlite_begin", e))?;
        Ok(Box::new(SqliteSession {
            conn,
            finished: false,
        }))
    }
}

/// A `SQLite` transaction holding the connection lock.
struct SqliteSession<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl SqliteSession<'_> {
    fn query(&self, kind: StatementKind, sql: &str, args: &[&dyn ToSql]) -> Result<Vec<Row>> {
        let columns = kind.columns();
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| sqlite_error(kind, &e))?;
        let rows = stmt
            .query_map(args, |row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        row.get_ref(idx)
                            .map(|value| ((*column).to_string(), to_store_value(value)))
                    })
                    .collect::<rusqlite::Result<Row>>()
            })
            .map_err(|e| sqlite_error(kind, &e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| sqlite_error(kind, &e))
    }

    fn execute(&self, kind: StatementKind, sql: &str, args: &[&dyn ToSql]) -> Result<()> {
        self.conn
            .execute(sql, args)
            .map(|_| ())
            .map_err(|e| sqlite_error(kind, &e))
    }

    fn movie_details(&self, title: &str) -> Result<Vec<Row>> {
        let kind = StatementKind::MovieDetails;
        let movie = self
            .conn
            .query_row(
                "SELECT title, released, tagline FROM graph_movies WHERE title = ?1",
                params![title],
                |row| {
                    let mut properties = BTreeMap::new();
                    for (idx, key) in ["title", "released", "tagline"].into_iter().enumerate() {
                        let value = to_store_value(row.get_ref(idx)?);
                        // Graph nodes never hold null properties.
                        if !value.is_null() {
                            properties.insert(key.to_string(), value);
                        }
                    }
                    Ok(properties)
                },
            )
            .optional()
            .map_err(|e| sqlite_error(kind, &e))?;

        let Some(properties) = movie else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT person_name, role FROM graph_credits
                 WHERE movie_title = ?1 ORDER BY person_name, role",
            )
            .map_err(|e| sqlite_error(kind, &e))?;
        let people = stmt
            .query_map(params![title], |row| {
                let person: String = row.get(0)?;
                let role: String = row.get(1)?;
                Ok(StoreValue::Map(BTreeMap::from([
                    ("person".to_string(), StoreValue::String(person)),
                    ("role".to_string(), StoreValue::String(role)),
                ])))
            })
            .map_err(|e| sqlite_error(kind, &e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| sqlite_error(kind, &e))?;

        Ok(vec![Row::from([
            (
                "m".to_string(),
                StoreValue::Node {
                    labels: vec!["Movie".to_string()],
                    properties,
                },
            ),
            ("people".to_string(), StoreValue::List(people)),
        ])])
    }

    fn merge_credit(&self, statement: &Statement, role: RelationshipRole) -> Result<()> {
        let kind = statement.kind();
        let name = statement.text_param(PARAM_NAME)?;
        let title = statement.text_param(PARAM_TITLE)?;
        self.execute(
            kind,
            "INSERT OR IGNORE INTO graph_people (name) VALUES (?1)",
            &[&name],
        )?;
        self.execute(
            kind,
            "INSERT OR IGNORE INTO graph_movies (title) VALUES (?1)",
            &[&title],
        )?;
        self.execute(
            kind,
            "INSERT OR IGNORE INTO graph_credits (person_name, movie_title, role)
             VALUES (?1, ?2, ?3)",
            &[&name, &title, &role.as_str()],
        )
    }
}

impl GraphSession for SqliteSession<'_> {
    #[instrument(skip(self, statement), fields(kind = %statement.kind()))]
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        let kind = statement.kind();
        let directed = RelationshipRole::Directed.as_str();
        let produced = RelationshipRole::Produced.as_str();
        let acted_in = RelationshipRole::ActedIn.as_str();

        match kind {
            StatementKind::ListMovies => self.query(
                kind,
                "SELECT title FROM graph_movies ORDER BY title",
                &[],
            ),
            StatementKind::ListPeople => {
                self.query(kind, "SELECT name FROM graph_people ORDER BY name", &[])
            },
            StatementKind::MovieDetails => self.movie_details(statement.text_param(PARAM_TITLE)?),
            StatementKind::ActorFilmography => {
                let name = statement.text_param(PARAM_NAME)?;
                self.query(kind, ACTOR_FILMOGRAPHY_SQL, &[&name, &acted_in])
            },
            StatementKind::DirectorProducerFilmography => {
                let name = statement.text_param(PARAM_NAME)?;
                self.query(kind, DIRECTOR_PRODUCER_SQL, &[&name, &directed, &produced])
            },
            StatementKind::RelatedMovies => {
                let title = statement.text_param(PARAM_TITLE)?;
                self.query(kind, RELATED_MOVIES_SQL, &[&title, &directed, &produced])
            },
            StatementKind::TopActor => self.query(kind, TOP_ACTOR_SQL, &[&acted_in]),
            StatementKind::MergeMovie => {
                let title = statement.text_param(PARAM_TITLE)?;
                let released = statement.integer_param(PARAM_RELEASED)?;
                let tagline = statement.text_param(PARAM_TAGLINE)?;
                self.execute(
                    kind,
                    "INSERT INTO graph_movies (title, released, tagline) VALUES (?1, ?2, ?3)
                     ON CONFLICT(title) DO UPDATE SET
                        released = excluded.released,
                        tagline = excluded.tagline",
                    &[&title, &released, &tagline],
                )?;
                Ok(Vec::new())
            },
            StatementKind::MergeCredit(role) => {
                self.merge_credit(statement, role)?;
                Ok(Vec::new())
            },
        }
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finished = true;
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(Error::operation("sqlite_commit", e));
        }
        Ok(())
    }
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(error = %e, "Failed to roll back SQLite graph session");
        }
    }
}

/// Converts a borrowed `SQLite` value into a [`StoreValue`].
fn to_store_value(value: ValueRef<'_>) -> StoreValue {
    match value {
        ValueRef::Null => StoreValue::Null,
        ValueRef::Integer(n) => StoreValue::Integer(n),
        ValueRef::Real(f) => StoreValue::Float(f),
        ValueRef::Text(bytes) => StoreValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => StoreValue::Bytes(bytes.to_vec()),
    }
}

fn sqlite_error(kind: StatementKind, e: &rusqlite::Error) -> Error {
    Error::OperationFailed {
        operation: format!("sqlite_{}", kind.name()),
        cause: e.to_string(),
    }
}
