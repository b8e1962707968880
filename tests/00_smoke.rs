//! Index, health, and routing smoke checks.

mod common;

use axum::http::{Method, StatusCode};

use common::spawn_app;

#[tokio::test]
async fn index_lists_the_api_surface() {
    let app = spawn_app().await;

    let (status, body) = app.request(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "larder-api");
    assert!(body["endpoints"]["recipes"].is_string());
}

#[tokio::test]
async fn health_reports_database_connectivity() {
    let app = spawn_app().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = spawn_app().await;

    let (status, _) = app.request(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
