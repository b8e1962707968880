use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::models::User;

pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Profile changes; `None` fields are left untouched.
#[derive(Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, is_active, is_staff, is_superuser, last_login";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_active_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ? AND is_active = 1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a new user row. A duplicate (normalized) email surfaces as a
/// unique-constraint error for the caller to translate.
pub async fn insert(pool: &SqlitePool, new: NewUser) -> Result<User, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, name, is_active, is_staff, is_superuser)
         VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.name)
    .bind(new.is_staff)
    .bind(new.is_superuser)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await
}

pub async fn touch_last_login(
    pool: &SqlitePool,
    id: i64,
    when: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(when)
        .bind(id)
        .execute(pool)
        .await
        .map(|_| ())
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    changes: UserChanges,
) -> Result<User, sqlx::Error> {
    let current = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;

    let email = changes.email.unwrap_or(current.email);
    let name = changes.name.unwrap_or(current.name);
    let password_hash = changes.password_hash.unwrap_or(current.password_hash);

    sqlx::query("UPDATE users SET email = ?, name = ?, password_hash = ? WHERE id = ?")
        .bind(&email)
        .bind(&name)
        .bind(&password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_one(pool)
        .await
}
