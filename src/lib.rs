use std::sync::Arc;

use sqlx::SqlitePool;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;

use crate::config::AppConfig;
use crate::media::MediaStore;

/// Shared per-process context handed to every handler via axum `State`.
///
/// Configuration lives here instead of in a global so the whole request
/// path can be exercised against a scratch database and media root.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, media: MediaStore) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            media,
        }
    }
}
