//! Shared repository for tags and ingredients.
//!
//! Both resources are (owner, name) pairs linked to recipes through a join
//! table, so one set of queries serves both, parameterized by table names.

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::models::Attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Resource name used in client-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag",
            AttributeKind::Ingredient => "ingredient",
        }
    }
}

/// List an owner's attributes, name ascending. With `assigned_only`, only
/// rows linked to at least one recipe are returned; DISTINCT collapses the
/// join multiplication when one row is used by several recipes.
pub async fn list(
    pool: &SqlitePool,
    kind: AttributeKind,
    owner: i64,
    assigned_only: bool,
) -> Result<Vec<Attribute>, sqlx::Error> {
    let sql = if assigned_only {
        format!(
            "SELECT DISTINCT a.id, a.user_id, a.name FROM {table} a
             JOIN {link} l ON l.{column} = a.id
             WHERE a.user_id = ? ORDER BY a.name ASC",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        )
    } else {
        format!(
            "SELECT id, user_id, name FROM {table} WHERE user_id = ? ORDER BY name ASC",
            table = kind.table(),
        )
    };

    sqlx::query_as::<_, Attribute>(&sql)
        .bind(owner)
        .fetch_all(pool)
        .await
}

pub async fn find(
    pool: &SqlitePool,
    kind: AttributeKind,
    owner: i64,
    id: i64,
) -> Result<Option<Attribute>, sqlx::Error> {
    sqlx::query_as::<_, Attribute>(&format!(
        "SELECT id, user_id, name FROM {} WHERE id = ? AND user_id = ?",
        kind.table(),
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

/// Insert a new attribute. A duplicate (owner, name) pair surfaces as a
/// unique-constraint error for the caller to translate.
pub async fn create(
    pool: &SqlitePool,
    kind: AttributeKind,
    owner: i64,
    name: &str,
) -> Result<Attribute, sqlx::Error> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, name) VALUES (?, ?)",
        kind.table(),
    ))
    .bind(owner)
    .bind(name)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Attribute>(&format!(
        "SELECT id, user_id, name FROM {} WHERE id = ?",
        kind.table(),
    ))
    .bind(result.last_insert_rowid())
    .fetch_one(pool)
    .await
}

/// Rename an attribute. Returns `None` when the row is absent or owned by
/// someone else.
pub async fn update(
    pool: &SqlitePool,
    kind: AttributeKind,
    owner: i64,
    id: i64,
    name: &str,
) -> Result<Option<Attribute>, sqlx::Error> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET name = ? WHERE id = ? AND user_id = ?",
        kind.table(),
    ))
    .bind(name)
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, kind, owner, id).await
}

/// Delete an attribute and its recipe links. Returns false when the row is
/// absent or owned by someone else.
pub async fn delete(
    pool: &SqlitePool,
    kind: AttributeKind,
    owner: i64,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let owned: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE id = ? AND user_id = ?",
        kind.table(),
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(&mut *tx)
    .await?;

    if owned.is_none() {
        return Ok(false);
    }

    sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = ?",
        kind.link_table(),
        kind.link_column(),
    ))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Attributes linked to one recipe, name ascending.
pub async fn for_recipe(
    pool: &SqlitePool,
    kind: AttributeKind,
    recipe_id: i64,
) -> Result<Vec<Attribute>, sqlx::Error> {
    sqlx::query_as::<_, Attribute>(&format!(
        "SELECT a.id, a.user_id, a.name FROM {table} a
         JOIN {link} l ON l.{column} = a.id
         WHERE l.recipe_id = ? ORDER BY a.name ASC",
        table = kind.table(),
        link = kind.link_table(),
        column = kind.link_column(),
    ))
    .bind(recipe_id)
    .fetch_all(pool)
    .await
}

/// Resolve names to ids, creating missing rows, scoped to the owner. The
/// UNIQUE(user_id, name) constraint plus DO NOTHING makes concurrent
/// identical requests converge on one row instead of racing.
pub(crate) async fn get_or_create_ids(
    tx: &mut Transaction<'_, Sqlite>,
    kind: AttributeKind,
    owner: i64,
    names: &[String],
) -> Result<Vec<i64>, sqlx::Error> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        sqlx::query(&format!(
            "INSERT INTO {} (user_id, name) VALUES (?, ?) ON CONFLICT (user_id, name) DO NOTHING",
            kind.table(),
        ))
        .bind(owner)
        .bind(name)
        .execute(&mut **tx)
        .await?;

        let id: i64 = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE user_id = ? AND name = ?",
            kind.table(),
        ))
        .bind(owner)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Replace a recipe's association set wholesale; an empty name list clears
/// every link.
pub(crate) async fn replace_recipe_links(
    tx: &mut Transaction<'_, Sqlite>,
    kind: AttributeKind,
    owner: i64,
    recipe_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = ?",
        kind.link_table(),
    ))
    .bind(recipe_id)
    .execute(&mut **tx)
    .await?;

    let ids = get_or_create_ids(tx, kind, owner, names).await?;
    for attribute_id in ids {
        sqlx::query(&format!(
            "INSERT INTO {} (recipe_id, {}) VALUES (?, ?) ON CONFLICT DO NOTHING",
            kind.link_table(),
            kind.link_column(),
        ))
        .bind(recipe_id)
        .bind(attribute_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
