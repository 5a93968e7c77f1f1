//! Pattern-matching statements issued against the graph store.
//!
//! Each logical operation maps to exactly one [`StatementKind`] with a fixed
//! Cypher template. Callers supply values only through named parameters; the
//! structural part of a query (labels, edge types, clauses) is never built
//! from input. The edge label of a credit merge is chosen by matching on
//! [`RelationshipRole`], so only the four known labels can ever appear.
//!
//! # Row contracts
//!
//! | Kind | Columns |
//! |------|---------|
//! | `ListMovies` | `title` |
//! | `ListPeople` | `name` |
//! | `MovieDetails` | `m` (movie node), `people` (list of `{person, role}`) |
//! | `ActorFilmography` | `title` |
//! | `DirectorProducerFilmography` | `title`, `role` |
//! | `RelatedMovies` | `title`, `role` |
//! | `TopActor` | `name`, `movie_count` |
//! | `MergeMovie`, `MergeCredit` | none |
//!
//! Backends that do not speak Cypher must produce rows with exactly these
//! columns and the ordering described by the template.

use crate::models::RelationshipRole;
use crate::storage::value::StoreValue;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter carrying a movie title.
pub const PARAM_TITLE: &str = "title";
/// Parameter carrying a person name.
pub const PARAM_NAME: &str = "name";
/// Parameter carrying a release year.
pub const PARAM_RELEASED: &str = "released";
/// Parameter carrying a tagline.
pub const PARAM_TAGLINE: &str = "tagline";

const LIST_MOVIES: &str = "MATCH (m:Movie) RETURN m.title AS title ORDER BY title";

const LIST_PEOPLE: &str = "MATCH (p:Person) RETURN p.name AS name ORDER BY name";

const MOVIE_DETAILS: &str = "MATCH (m:Movie {title: $title}) \
     OPTIONAL MATCH (p:Person)-[r:ACTED_IN|DIRECTED|PRODUCED|WROTE]->(m) \
     RETURN m, [c IN collect({person: p.name, role: type(r)}) WHERE c.person IS NOT NULL] AS people";

const ACTOR_FILMOGRAPHY: &str = "MATCH (p:Person {name: $name})-[:ACTED_IN]->(m:Movie) \
     RETURN m.title AS title ORDER BY title";

const DIRECTOR_PRODUCER_FILMOGRAPHY: &str = "MATCH (p:Person {name: $name})-[r:DIRECTED|PRODUCED]->(m:Movie) \
     RETURN m.title AS title, type(r) AS role ORDER BY title, role";

const RELATED_MOVIES: &str = "MATCH (m:Movie {title: $title})<-[:DIRECTED|PRODUCED]-(p:Person) \
     MATCH (p)-[r2:DIRECTED|PRODUCED]->(m2:Movie) \
     WHERE m2.title <> $title \
     RETURN DISTINCT m2.title AS title, type(r2) AS role ORDER BY title, role";

const TOP_ACTOR: &str = "MATCH (p:Person)-[:ACTED_IN]->(m:Movie) \
     RETURN p.name AS name, count(DISTINCT m) AS movie_count \
     ORDER BY movie_count DESC, name ASC LIMIT 1";

const MERGE_MOVIE: &str = "MERGE (m:Movie {title: $title}) \
     SET m.released = $released, m.tagline = $tagline";

const MERGE_ACTED_IN: &str = "MERGE (p:Person {name: $name}) \
     MERGE (m:Movie {title: $title}) MERGE (p)-[:ACTED_IN]->(m)";

const MERGE_DIRECTED: &str = "MERGE (p:Person {name: $name}) \
     MERGE (m:Movie {title: $title}) MERGE (p)-[:DIRECTED]->(m)";

const MERGE_PRODUCED: &str = "MERGE (p:Person {name: $name}) \
     MERGE (m:Movie {title: $title}) MERGE (p)-[:PRODUCED]->(m)";

const MERGE_WROTE: &str = "MERGE (p:Person {name: $name}) \
     MERGE (m:Movie {title: $title}) MERGE (p)-[:WROTE]->(m)";

/// The fixed set of statements the core can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// All movie titles.
    ListMovies,
    /// All person names.
    ListPeople,
    /// One movie and its incoming credits.
    MovieDetails,
    /// Titles a person acted in.
    ActorFilmography,
    /// Movies a person directed or produced.
    DirectorProducerFilmography,
    /// Movies sharing a director or producer with a given movie.
    RelatedMovies,
    /// Person with the most acting credits.
    TopActor,
    /// Create-or-update a movie node.
    MergeMovie,
    /// Create-if-absent a person node and one credit edge.
    MergeCredit(RelationshipRole),
}

impl StatementKind {
    /// Returns a stable name used in logs, metrics and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ListMovies => "list_movies",
            Self::ListPeople => "list_people",
            Self::MovieDetails => "movie_details",
            Self::ActorFilmography => "actor_filmography",
            Self::DirectorProducerFilmography => "director_producer_filmography",
            Self::RelatedMovies => "related_movies",
            Self::TopActor => "top_actor",
            Self::MergeMovie => "merge_movie",
            Self::MergeCredit(_) => "merge_credit",
        }
    }

    /// Returns the Cypher template.
    #[must_use]
    pub const fn cypher(&self) -> &'static str {
        match self {
            Self::ListMovies => LIST_MOVIES,
            Self::ListPeople => LIST_PEOPLE,
            Self::MovieDetails => MOVIE_DETAILS,
            Self::ActorFilmography => ACTOR_FILMOGRAPHY,
            Self::DirectorProducerFilmography => DIRECTOR_PRODUCER_FILMOGRAPHY,
            Self::RelatedMovies => RELATED_MOVIES,
            Self::TopActor => TOP_ACTOR,
            Self::MergeMovie => MERGE_MOVIE,
            Self::MergeCredit(role) => match role {
                RelationshipRole::ActedIn => MERGE_ACTED_IN,
                RelationshipRole::Directed => MERGE_DIRECTED,
                RelationshipRole::Produced => MERGE_PRODUCED,
                RelationshipRole::Wrote => MERGE_WROTE,
            },
        }
    }

    /// Returns the columns every row of this statement carries.
    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::ListMovies | Self::ActorFilmography => &["title"],
            Self::ListPeople => &["name"],
            Self::MovieDetails => &["m", "people"],
            Self::DirectorProducerFilmography | Self::RelatedMovies => &["title", "role"],
            Self::TopActor => &["name", "movie_count"],
            Self::MergeMovie | Self::MergeCredit(_) => &[],
        }
    }

    /// Returns `true` if the statement mutates the graph.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::MergeMovie | Self::MergeCredit(_))
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A statement ready to run: a fixed template plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    params: BTreeMap<&'static str, StoreValue>,
}

impl Statement {
    fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    fn with_param(mut self, name: &'static str, value: impl Into<StoreValue>) -> Self {
        self.params.insert(name, value.into());
        self
    }

    /// All movie titles, ascending.
    #[must_use]
    pub fn list_movies() -> Self {
        Self::new(StatementKind::ListMovies)
    }

    /// All person names, ascending.
    #[must_use]
    pub fn list_people() -> Self {
        Self::new(StatementKind::ListPeople)
    }

    /// Movie node and credits for an exact title.
    #[must_use]
    pub fn movie_details(title: &str) -> Self {
        Self::new(StatementKind::MovieDetails).with_param(PARAM_TITLE, title)
    }

    /// Titles the named person acted in, ascending.
    #[must_use]
    pub fn actor_filmography(name: &str) -> Self {
        Self::new(StatementKind::ActorFilmography).with_param(PARAM_NAME, name)
    }

    /// Directed/produced titles of the named person, by title.
    #[must_use]
    pub fn director_producer_filmography(name: &str) -> Self {
        Self::new(StatementKind::DirectorProducerFilmography).with_param(PARAM_NAME, name)
    }

    /// Two-hop related movies of a title, by title.
    #[must_use]
    pub fn related_movies(title: &str) -> Self {
        Self::new(StatementKind::RelatedMovies).with_param(PARAM_TITLE, title)
    }

    /// The person with the most acting credits.
    #[must_use]
    pub fn top_actor() -> Self {
        Self::new(StatementKind::TopActor)
    }

    /// Create-or-update a movie, overwriting `released` and `tagline`.
    #[must_use]
    pub fn merge_movie(title: &str, released: i64, tagline: &str) -> Self {
        Self::new(StatementKind::MergeMovie)
            .with_param(PARAM_TITLE, title)
            .with_param(PARAM_RELEASED, released)
            .with_param(PARAM_TAGLINE, tagline)
    }

    /// Ensure the person exists and holds exactly one `role` edge into the movie.
    #[must_use]
    pub fn merge_credit(person: &str, title: &str, role: RelationshipRole) -> Self {
        Self::new(StatementKind::MergeCredit(role))
            .with_param(PARAM_NAME, person)
            .with_param(PARAM_TITLE, title)
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the Cypher template text.
    #[must_use]
    pub const fn cypher(&self) -> &'static str {
        self.kind.cypher()
    }

    /// Returns all parameters.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<&'static str, StoreValue> {
        &self.params
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&StoreValue> {
        self.params.get(name)
    }

    /// Returns a string parameter, failing if it is missing or not a string.
    pub fn text_param(&self, name: &str) -> Result<&str> {
        self.param(name)
            .and_then(StoreValue::as_str)
            .ok_or_else(|| missing_param(self.kind, name))
    }

    /// Returns an integer parameter, failing if it is missing or not an integer.
    pub fn integer_param(&self, name: &str) -> Result<i64> {
        match self.param(name) {
            Some(StoreValue::Integer(n)) => Ok(*n),
            _ => Err(missing_param(self.kind, name)),
        }
    }
}

fn missing_param(kind: StatementKind, name: &str) -> Error {
    Error::operation(kind.name(), format!("missing statement parameter '{name}'"))
}
