//! REST transport.
//!
//! All routes live under `/api`:
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/api/movies` | list movies |
//! | GET | `/api/people` | list people |
//! | GET | `/api/movie/{title}` | movie details |
//! | GET | `/api/actor/{name}` | actor filmography |
//! | GET | `/api/director-producer/{name}` | director/producer filmography |
//! | GET | `/api/related-movies/{title}` | related movies |
//! | GET | `/api/top-actor` | top actor |
//! | POST | `/api/add-data` | add data |
//!
//! Errors are `{"error": "<message>"}`. Unknown routes get 404. Each response
//! carries the request's `x-request-id`.

mod handlers;

pub use handlers::ApiError;

use crate::config::ServerConfig;
use crate::observability::{REQUEST_ID_HEADER, RequestContext, scope_request_context};
use crate::services::MovieCatalog;
use crate::storage::GraphStore;
use crate::{Error, Result};
use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Catalog shared by all handlers.
pub type SharedCatalog = Arc<MovieCatalog<Arc<dyn GraphStore>>>;

/// Builds the application router.
///
/// # Errors
///
/// Returns an error if the configured CORS origin is not a valid header value.
pub fn router(catalog: SharedCatalog, config: &ServerConfig) -> Result<Router> {
    let origin = HeaderValue::from_str(&config.cors_origin).map_err(|e| {
        Error::InvalidInput(format!("invalid CORS origin {:?}: {e}", config.cors_origin))
    })?;
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, request_id.clone()])
        .expose_headers([request_id]);

    let api = Router::new()
        .route("/movies", get(handlers::list_movies))
        .route("/people", get(handlers::list_people))
        .route("/movie/{title}", get(handlers::movie_details))
        .route("/actor/{name}", get(handlers::actor_filmography))
        .route(
            "/director-producer/{name}",
            get(handlers::director_producer_filmography),
        )
        .route("/related-movies/{title}", get(handlers::related_movies))
        .route("/top-actor", get(handlers::top_actor))
        .route("/add-data", post(handlers::add_data));

    Ok(Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context))
        .layer(cors)
        .with_state(catalog))
}

/// Scopes a [`RequestContext`] around the request and echoes its id.
async fn request_context(request: Request, next: Next) -> Response {
    let context = RequestContext::from_header(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    let request_id = context.request_id().to_string();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let mut response = scope_request_context(context, next.run(request)).await;
    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        request_id = %request_id,
        "Handled request"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serves the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the router cannot be built, the address cannot be
/// bound, or the server fails.
pub async fn serve(catalog: SharedCatalog, config: &ServerConfig) -> Result<()> {
    let app = router(catalog, config)?;
    let addr = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::operation("bind", format!("{addr}: {e}")))?;
    tracing::info!(%addr, "Server running on http://{addr}/api/movies");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::operation("serve", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
