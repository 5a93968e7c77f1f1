//! REST API tests.
//!
//! Requests go through the full router (middleware included) against an
//! in-memory `SQLite` store, without binding a socket.

#![cfg(feature = "http")]
// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use movie_graph::config::ServerConfig;
use movie_graph::http::router;
use movie_graph::services::MovieCatalog;
use movie_graph::storage::GraphStore;
use movie_graph::storage::graph::SqliteGraphStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let store: Arc<dyn GraphStore> = Arc::new(SqliteGraphStore::in_memory().unwrap());
    router(Arc::new(MovieCatalog::new(store)), &ServerConfig::default()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, body: &Value) -> (StatusCode, Value) {
    let request = Request::post("/api/add-data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_then_read_back() {
    let app = app();

    let (status, body) = post_json(
        &app,
        &json!({
            "movieTitle": "Inception",
            "movieYear": 2010,
            "movieTagline": "Dreams feel real",
            "personName": "Leonardo DiCaprio",
            "personRole": "ACTED_IN",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Data added successfully"}));

    let (status, body) = get(&app, "/api/movie/Inception").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "Inception",
            "released": 2010,
            "tagline": "Dreams feel real",
            "people": [{"person": "Leonardo DiCaprio", "role": "ACTED_IN"}],
        })
    );

    assert_eq!(get(&app, "/api/movies").await.1, json!(["Inception"]));
    assert_eq!(get(&app, "/api/people").await.1, json!(["Leonardo DiCaprio"]));
    assert_eq!(
        get(&app, "/api/actor/Leonardo%20DiCaprio").await.1,
        json!(["Inception"])
    );
    assert_eq!(
        get(&app, "/api/top-actor").await.1,
        json!({"name": "Leonardo DiCaprio", "movieCount": 1})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_path_segments_are_percent_decoded() {
    let app = app();
    post_json(
        &app,
        &json!({"movieTitle": "The Matrix", "movieYear": "1999", "personName": "Lana Wachowski", "personRole": "DIRECTED"}),
    )
    .await;
    post_json(
        &app,
        &json!({"movieTitle": "Cloud Atlas", "movieYear": 2012, "personName": "Lana Wachowski", "personRole": "DIRECTED"}),
    )
    .await;

    let (status, body) = get(&app, "/api/movie/The%20Matrix").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], json!(1999));

    assert_eq!(
        get(&app, "/api/director-producer/Lana%20Wachowski").await.1,
        json!([
            {"title": "Cloud Atlas", "role": "DIRECTED"},
            {"title": "The Matrix", "role": "DIRECTED"},
        ])
    );
    assert_eq!(
        get(&app, "/api/related-movies/The%20Matrix").await.1,
        json!([{"title": "Cloud Atlas", "role": "DIRECTED"}])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_dataset() {
    let app = app();

    assert_eq!(get(&app, "/api/movies").await, (StatusCode::OK, json!([])));
    assert_eq!(get(&app, "/api/actor/Nobody").await, (StatusCode::OK, json!([])));
    assert_eq!(
        get(&app, "/api/related-movies/Nothing").await,
        (StatusCode::OK, json!([]))
    );
    assert_eq!(
        get(&app, "/api/top-actor").await,
        (
            StatusCode::OK,
            json!({"name": "no actors found", "movieCount": 0})
        )
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_movie_is_404() {
    let (status, body) = get(&app(), "/api/movie/Ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Movie not found"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_route_is_404() {
    let (status, body) = get(&app(), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_fields_are_400() {
    let app = app();

    let (status, body) = post_json(&app, &json!({"movieTitle": "Heat"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Movie title and year are required"}));

    let (status, body) = post_json(&app, &json!({"movieTitle": "Heat", "movieYear": "soon"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Movie year must be an integer"}));

    assert_eq!(get(&app, "/api/movies").await.1, json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_role_is_400() {
    let app = app();
    let (status, body) = post_json(
        &app,
        &json!({"movieTitle": "Heat", "movieYear": 1995, "personName": "Al Pacino", "personRole": "HACKED"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid relationship role: HACKED"}));
    assert_eq!(get(&app, "/api/people").await.1, json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_body_is_400() {
    let request = Request::post("/api/add-data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_id_is_echoed() {
    let app = app();

    let request = Request::get("/api/movies")
        .header("x-request-id", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me-42");

    let response = app
        .oneshot(Request::get("/api/movies").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(!generated.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_security_headers() {
    let response = app()
        .oneshot(Request::get("/api/movies").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cors_allows_configured_origin() {
    let request = Request::get("/api/movies")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
