//! Shared test harness: the real application router wired to an in-memory
//! database and a scratch media directory, driven in-process.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use larder_api::config::AppConfig;
use larder_api::db;
use larder_api::handlers;
use larder_api::media::MediaStore;
use larder_api::AppState;

pub const PASSWORD: &str = "test-pass-123";

/// 1x1 transparent PNG, the smallest well-formed image payload.
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    media_root: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let mut config = AppConfig::from_env();
    config.database.url = "sqlite::memory:".to_string();
    config.security.jwt_secret = "integration-test-secret".to_string();

    let media_root = TempDir::new().expect("media tempdir");
    config.media.root = media_root.path().to_path_buf();

    let pool = db::connect(&config.database).await.expect("open database");
    db::migrate(&pool).await.expect("run migrations");

    let media = MediaStore::new(config.media.root.clone());
    media.ensure_exists().await.expect("media directories");

    let state = AppState::new(pool.clone(), config, media);
    TestApp {
        router: handlers::router(state),
        pool,
        media_root,
    }
}

impl TestApp {
    pub fn media_path(&self) -> &std::path::Path {
        self.media_root.path()
    }

    /// Dispatch a request and decode the JSON body (Null for empty bodies).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self.router.clone().oneshot(request).await.expect("dispatch");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    /// Dispatch a request and return the raw body, for non-JSON responses.
    pub async fn request_raw(&self, method: Method, uri: &str) -> (StatusCode, Bytes) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("build request");

        let response = self.router.clone().oneshot(request).await.expect("dispatch");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, bytes)
    }

    /// POST a single-file multipart form, as the image upload endpoint takes.
    pub async fn post_multipart(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "larder-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("build request");

        let response = self.router.clone().oneshot(request).await.expect("dispatch");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    pub async fn register(&self, email: &str) {
        let (status, body) = self
            .request(
                Method::POST,
                "/users/",
                None,
                Some(json!({"email": email, "password": PASSWORD, "name": "Test User"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    }

    pub async fn obtain_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/token/",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "token failed: {}", body);
        body["data"]["access"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Register a fresh user and return their access token.
    pub async fn signup(&self, email: &str) -> String {
        self.register(email).await;
        self.obtain_token(email, PASSWORD).await
    }

    /// Create a recipe for the token's owner and return its id.
    pub async fn create_recipe(&self, token: &str, payload: Value) -> i64 {
        let (status, body) = self
            .request(Method::POST, "/recipes/", Some(token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create recipe failed: {}", body);
        body["data"]["id"].as_i64().expect("recipe id")
    }
}

/// Minimal valid recipe payload.
pub fn recipe_payload(title: &str) -> Value {
    json!({
        "title": title,
        "time_minutes": 10,
        "price": "5.25",
    })
}
