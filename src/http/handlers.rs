//! Route handlers and error mapping.
//!
//! Catalog calls block on the graph store, so every handler moves its call
//! onto the blocking pool together with the caller's request context.

use super::SharedCatalog;
use crate::Error;
use crate::models::{AddDataRequest, AddDataResponse, MovieDetails, MovieRole, TopActor};
use crate::observability::{current_request_context, enter_request_context};
use crate::services::MovieCatalog;
use crate::storage::GraphStore;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;

/// Error response: a status and a `{"error": message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates an error response.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Maps a catalog error, using `failure` for store-side errors.
    ///
    /// Store error details are logged by the catalog, never sent to clients.
    #[must_use]
    pub fn from_catalog(error: Error, failure: &'static str) -> Self {
        match error {
            Error::InvalidInput(message) => Self::new(StatusCode::BAD_REQUEST, message),
            Error::InvalidRole(role) => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid relationship role: {role}"),
            ),
            Error::NotFound { entity: "movie", .. } => {
                Self::new(StatusCode::NOT_FOUND, "Movie not found")
            },
            Error::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Not found"),
            Error::OperationFailed { .. } | Error::FeatureNotEnabled(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            },
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Runs a catalog call on the blocking pool.
async fn blocking<T, F>(catalog: &SharedCatalog, failure: &'static str, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&MovieCatalog<Arc<dyn GraphStore>>) -> crate::Result<T> + Send + 'static,
{
    let catalog = Arc::clone(catalog);
    let context = current_request_context();
    let joined = tokio::task::spawn_blocking(move || {
        let _guard = context.map(enter_request_context);
        call(&catalog)
    })
    .await;

    match joined {
        Ok(result) => result
            .map(Json)
            .map_err(|e| ApiError::from_catalog(e, failure)),
        Err(e) => {
            tracing::error!(error = %e, "Catalog task failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, failure))
        },
    }
}

/// `GET /api/movies`
pub async fn list_movies(State(catalog): State<SharedCatalog>) -> ApiResult<Vec<String>> {
    blocking(&catalog, "Error fetching movies", MovieCatalog::list_movies).await
}

/// `GET /api/people`
pub async fn list_people(State(catalog): State<SharedCatalog>) -> ApiResult<Vec<String>> {
    blocking(&catalog, "Error fetching people", MovieCatalog::list_people).await
}

/// `GET /api/movie/{title}`
pub async fn movie_details(
    State(catalog): State<SharedCatalog>,
    Path(title): Path<String>,
) -> ApiResult<MovieDetails> {
    blocking(&catalog, "Error fetching movie details", move |c| {
        c.movie_details(&title)
    })
    .await
}

/// `GET /api/actor/{name}`
pub async fn actor_filmography(
    State(catalog): State<SharedCatalog>,
    Path(name): Path<String>,
) -> ApiResult<Vec<String>> {
    blocking(&catalog, "Error fetching actor movies", move |c| {
        c.actor_filmography(&name)
    })
    .await
}

/// `GET /api/director-producer/{name}`
pub async fn director_producer_filmography(
    State(catalog): State<SharedCatalog>,
    Path(name): Path<String>,
) -> ApiResult<Vec<MovieRole>> {
    blocking(
        &catalog,
        "Error fetching director/producer movies",
        move |c| c.director_producer_filmography(&name),
    )
    .await
}

/// `GET /api/related-movies/{title}`
pub async fn related_movies(
    State(catalog): State<SharedCatalog>,
    Path(title): Path<String>,
) -> ApiResult<Vec<MovieRole>> {
    blocking(&catalog, "Error fetching related movies", move |c| {
        c.related_movies(&title)
    })
    .await
}

/// `GET /api/top-actor`
pub async fn top_actor(State(catalog): State<SharedCatalog>) -> ApiResult<TopActor> {
    blocking(&catalog, "Error fetching top actor", MovieCatalog::top_actor).await
}

/// `POST /api/add-data`
pub async fn add_data(
    State(catalog): State<SharedCatalog>,
    body: std::result::Result<Json<AddDataRequest>, JsonRejection>,
) -> ApiResult<AddDataResponse> {
    let Json(request) = body.map_err(|rejection| {
        tracing::info!(error = %rejection, "Rejected add-data body");
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    blocking(&catalog, "Error adding data", move |c| c.add_data(&request)).await
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (
                Error::InvalidInput("Movie title and year are required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (Error::InvalidRole("HACKED".to_string()), StatusCode::BAD_REQUEST),
            (
                Error::NotFound {
                    entity: "movie",
                    key: "Heat".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::operation("list_movies", "disk full"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::FeatureNotEnabled("neo4j".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from_catalog(error, "failed").status(), status);
        }
    }

    #[test]
    fn test_store_errors_are_not_leaked() {
        let error = ApiError::from_catalog(
            Error::operation("list_movies", "secret driver detail"),
            "Error fetching movies",
        );
        assert_eq!(error.message, "Error fetching movies");
    }
}
