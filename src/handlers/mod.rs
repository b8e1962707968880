//! Route handlers and router composition.

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::AppState;

pub mod attributes;
pub mod recipes;
pub mod users;

/// Assemble the full application router. Protected sub-routers sit behind
/// the bearer-token middleware; everything else is public. Stored media is
/// served by the same process under `/media/`.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(users::protected_routes())
        .merge(recipes::routes())
        .merge(attributes::routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(users::public_routes())
        .merge(protected)
        .nest_service("/media", ServeDir::new(state.media.root()))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - API index
async fn index() -> Json<Value> {
    Json(json!({
        "name": "larder-api",
        "description": "Recipe management REST API",
        "endpoints": {
            "register": "POST /users/",
            "token": "POST /token/",
            "token_refresh": "POST /token/refresh/",
            "profile": "GET|PATCH /me/",
            "recipes": "GET|POST /recipes/",
            "recipe": "GET|PUT|PATCH|DELETE /recipes/{id}/",
            "recipe_image": "POST /recipes/{id}/upload-image/",
            "tags": "GET|POST /tags/",
            "tag": "PUT|PATCH|DELETE /tags/{id}/",
            "ingredients": "GET|POST /ingredients/",
            "ingredient": "PUT|PATCH|DELETE /ingredients/{id}/",
            "media": "GET /media/{path}",
            "health": "GET /health"
        }
    }))
}

/// GET /health - liveness plus a database ping
async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    db::ping(&state.pool).await.map_err(|e| {
        tracing::error!("health check database ping failed: {}", e);
        ApiError::service_unavailable("Database is unreachable")
    })?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected"
    })))
}
