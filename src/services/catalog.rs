//! Movie catalog service.
//!
//! [`MovieCatalog`] is the single entry point for the eight logical
//! operations. Each call opens exactly one [`GraphSession`], runs its
//! statement(s), commits on success and otherwise lets the session roll back
//! when it is dropped. Every call is logged and metered under its operation
//! name.

use crate::models::{
    AddDataRequest, AddDataResponse, Credit, Movie, MovieDetails, MovieRole, TopActor,
};
use crate::observability::{current_request_id, record_operation};
use crate::services::decode::{decode_column, decode_rows};
use crate::services::upsert::MovieUpsert;
use crate::services::{ranking, traversal};
use crate::storage::{GraphSession, GraphStore, Statement};
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Service exposing the movie graph operations over a [`GraphStore`].
pub struct MovieCatalog<S: GraphStore> {
    store: S,
}

impl<S: GraphStore> MovieCatalog<S> {
    /// Creates a catalog over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Lists every movie title, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "list_movies"))]
    pub fn list_movies(&self) -> Result<Vec<String>> {
        self.run_operation("list_movies", |session| {
            let statement = Statement::list_movies();
            let rows = session.run(&statement)?;
            decode_column("list_movies", rows, "title")
        })
    }

    /// Lists every person name, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "list_people"))]
    pub fn list_people(&self) -> Result<Vec<String>> {
        self.run_operation("list_people", |session| {
            let rows = session.run(&Statement::list_people())?;
            decode_column("list_people", rows, "name")
        })
    }

    /// Returns a movie and everyone credited on it.
    ///
    /// Credits are ordered by person, then role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no movie has exactly this title, or an
    /// error if the store fails.
    #[instrument(skip(self), fields(operation = "movie_details", movie_title = %title))]
    pub fn movie_details(&self, title: &str) -> Result<MovieDetails> {
        self.run_operation("movie_details", |session| {
            let rows = session.run(&Statement::movie_details(title))?;
            let Some(row) = decode_rows::<DetailsRow>("movie_details", rows)?
                .into_iter()
                .next()
            else {
                tracing::info!(movie_title = %title, "Movie not found");
                return Err(Error::NotFound {
                    entity: "movie",
                    key: title.to_string(),
                });
            };

            let mut people = row.people;
            people.sort_by(|a, b| a.person.cmp(&b.person).then(a.role.cmp(&b.role)));
            people.dedup();
            Ok(MovieDetails::from_parts(row.m, people))
        })
    }

    /// Lists the titles a person acted in, ascending.
    ///
    /// An unknown person yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "actor_filmography", person_name = %name))]
    pub fn actor_filmography(&self, name: &str) -> Result<Vec<String>> {
        self.run_operation("actor_filmography", |session| {
            let rows = session.run(&Statement::actor_filmography(name))?;
            decode_column("actor_filmography", rows, "title")
        })
    }

    /// Lists the movies a person directed or produced, by title then role.
    ///
    /// An unknown person yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(
        skip(self),
        fields(operation = "director_producer_filmography", person_name = %name)
    )]
    pub fn director_producer_filmography(&self, name: &str) -> Result<Vec<MovieRole>> {
        self.run_operation("director_producer_filmography", |session| {
            let rows = session.run(&Statement::director_producer_filmography(name))?;
            let mut movies: Vec<MovieRole> = decode_rows("director_producer_filmography", rows)?;
            movies.retain(|movie| movie.role.is_director_or_producer());
            movies.sort();
            movies.dedup();
            Ok(movies)
        })
    }

    /// Lists movies sharing a director or producer with `title`.
    ///
    /// See [`traversal::related_movies`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "related_movies", movie_title = %title))]
    pub fn related_movies(&self, title: &str) -> Result<Vec<MovieRole>> {
        self.run_operation("related_movies", |session| {
            traversal::related_movies(session, title)
        })
    }

    /// Returns the person with the most acting credits.
    ///
    /// See [`ranking::top_actor`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(operation = "top_actor"))]
    pub fn top_actor(&self) -> Result<TopActor> {
        self.run_operation("top_actor", ranking::top_actor)
    }

    /// Records a movie and, optionally, one credit on it.
    ///
    /// The request is validated before the store is touched; the movie and
    /// credit merges commit together or not at all. Re-submitting the same
    /// request leaves the graph unchanged apart from the overwritten movie
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a missing or blank title or year,
    /// [`Error::InvalidRole`] for a role outside the closed set, or an error
    /// if the store fails.
    #[instrument(skip(self, request), fields(operation = "add_data"))]
    pub fn add_data(&self, request: &AddDataRequest) -> Result<AddDataResponse> {
        let upsert = match MovieUpsert::try_from(request) {
            Ok(upsert) => upsert,
            Err(e) => {
                tracing::info!(
                    action = "add_data",
                    error = %e,
                    request_id = current_request_id().as_deref().unwrap_or("-"),
                    "Rejected add-data request"
                );
                record_operation("add_data", false, 0.0);
                return Err(e);
            },
        };

        self.run_operation("add_data", |session| {
            upsert.apply(session)?;
            let (person_name, person_role) = upsert
                .credit
                .as_ref()
                .map_or(("-", "-"), |(person, role)| (person.as_str(), role.as_str()));
            tracing::info!(
                movie_title = %upsert.title,
                released = upsert.released,
                person_name,
                person_role,
                "Upserted movie"
            );
            Ok(AddDataResponse::added())
        })
    }

    /// Opens a session, runs `op`, commits on success, and logs and meters
    /// the outcome.
    fn run_operation<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&mut dyn GraphSession) -> Result<T>,
    {
        let start = Instant::now();
        let result = self.store.session().and_then(|mut session| {
            let value = op(session.as_mut())?;
            session.commit()?;
            Ok(value)
        });

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        let request_id = current_request_id();
        let request_id = request_id.as_deref().unwrap_or("-");
        let backend = self.store.backend_name();
        match &result {
            Ok(_) => tracing::info!(
                action = operation,
                backend,
                request_id,
                duration_ms,
                "Operation completed"
            ),
            Err(e @ Error::NotFound { .. }) => tracing::info!(
                action = operation,
                backend,
                request_id,
                duration_ms,
                error = %e,
                "Operation found nothing"
            ),
            Err(e) => tracing::error!(
                action = operation,
                backend,
                request_id,
                duration_ms,
                error = %e,
                "Operation failed"
            ),
        }
        record_operation(operation, result.is_ok(), duration_ms);

        result
    }
}

/// Row shape of the movie-details statement.
#[derive(serde::Deserialize)]
struct DetailsRow {
    m: Movie,
    #[serde(default)]
    people: Vec<Credit>,
}
