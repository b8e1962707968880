use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    /// Relative media path, e.g. `recipe/<uuid>.png`
    pub image: Option<String>,
}

// SQLite has no decimal type; price is stored as TEXT and decoded by hand.
impl FromRow<'_, SqliteRow> for Recipe {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_price: String = row.try_get("price")?;
        let price = Decimal::from_str(&raw_price).map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            time_minutes: row.try_get("time_minutes")?,
            price,
            description: row.try_get("description")?,
            link: row.try_get("link")?,
            image: row.try_get("image")?,
        })
    }
}

/// Row shape shared by tags and ingredients; both are (owner, name) pairs
/// attached to recipes through a join table.
#[derive(Debug, Clone, FromRow)]
pub struct Attribute {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}
