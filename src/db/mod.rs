use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub mod attributes;
pub mod models;
pub mod recipes;
pub mod users;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database unavailable after {0} attempts")]
    Unavailable(u64),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a connection pool for the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory SQLite database exists per connection, so the pool must
    // hold exactly one connection open for its whole lifetime.
    let memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    pool_options.connect_with(options).await
}

/// Connect with the startup wait loop: retry once per second until the
/// database answers a ping, bounded by `startup_wait_secs` attempts.
pub async fn connect_wait(config: &DatabaseConfig) -> Result<SqlitePool, DbError> {
    let attempts = config.startup_wait_secs.max(1);
    for attempt in 1..=attempts {
        match connect(config).await {
            Ok(pool) => match ping(&pool).await {
                Ok(()) => {
                    info!("Database connection successful");
                    return Ok(pool);
                }
                Err(e) => warn!("Database ping failed ({}), waiting 1 second", e),
            },
            Err(e) => warn!("Database connection failed ({}), waiting 1 second", e),
        }
        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
    Err(DbError::Unavailable(attempts))
}

pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Idempotent schema setup, run before the server starts accepting requests.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    const SCHEMA: &[&str] = &[
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_staff INTEGER NOT NULL DEFAULT 0,
            is_superuser INTEGER NOT NULL DEFAULT 0,
            last_login TEXT NULL
        )",
        "CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            time_minutes INTEGER NOT NULL,
            price TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            image TEXT NULL
        )",
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (user_id, name)
        )",
        "CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (user_id, name)
        )",
        "CREATE TABLE IF NOT EXISTS recipe_tags (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (recipe_id, tag_id)
        )",
        "CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
            PRIMARY KEY (recipe_id, ingredient_id)
        )",
    ];

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        startup_wait_secs: 1,
    };
    let pool = connect(&config).await.expect("open in-memory database");
    migrate(&pool).await.expect("run migrations");
    pool
}
