//! Recipe storage. Every statement is scoped to the owning user so rows
//! belonging to other principals are invisible rather than forbidden.

use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::attributes::{self, AttributeKind};
use crate::db::models::Recipe;

pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// Field changes; `None` leaves the stored value (or association set)
/// untouched, while `Some(vec![])` clears an association set.
#[derive(Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// Optional list filters: OR within each id list, AND across the two lists.
#[derive(Debug, Default)]
pub struct RecipeFilter {
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

const RECIPE_COLUMNS: &str =
    "r.id, r.user_id, r.title, r.time_minutes, r.price, r.description, r.link, r.image";

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// List an owner's recipes, newest first (ids are assigned monotonically).
/// Joining the filter tables can repeat a recipe that matches several ids,
/// so the projection is DISTINCT.
pub async fn list(
    pool: &SqlitePool,
    owner: i64,
    filter: &RecipeFilter,
) -> Result<Vec<Recipe>, sqlx::Error> {
    let mut sql = format!("SELECT DISTINCT {} FROM recipes r", RECIPE_COLUMNS);
    if !filter.tag_ids.is_empty() {
        sql.push_str(" JOIN recipe_tags rt ON rt.recipe_id = r.id");
    }
    if !filter.ingredient_ids.is_empty() {
        sql.push_str(" JOIN recipe_ingredients ri ON ri.recipe_id = r.id");
    }
    sql.push_str(" WHERE r.user_id = ?");
    if !filter.tag_ids.is_empty() {
        sql.push_str(&format!(
            " AND rt.tag_id IN ({})",
            placeholders(filter.tag_ids.len())
        ));
    }
    if !filter.ingredient_ids.is_empty() {
        sql.push_str(&format!(
            " AND ri.ingredient_id IN ({})",
            placeholders(filter.ingredient_ids.len())
        ));
    }
    sql.push_str(" ORDER BY r.id DESC");

    let mut query = sqlx::query_as::<_, Recipe>(&sql).bind(owner);
    for id in &filter.tag_ids {
        query = query.bind(id);
    }
    for id in &filter.ingredient_ids {
        query = query.bind(id);
    }
    query.fetch_all(pool).await
}

pub async fn find(
    pool: &SqlitePool,
    owner: i64,
    id: i64,
) -> Result<Option<Recipe>, sqlx::Error> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {} FROM recipes r WHERE r.id = ? AND r.user_id = ?",
        RECIPE_COLUMNS
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(pool)
    .await
}

async fn fetch_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner: i64,
    id: i64,
) -> Result<Option<Recipe>, sqlx::Error> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {} FROM recipes r WHERE r.id = ? AND r.user_id = ?",
        RECIPE_COLUMNS
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(&mut **tx)
    .await
}

/// Create a recipe and resolve any nested tag/ingredient names in the same
/// transaction, so a failure mid-way leaves nothing behind.
pub async fn create(pool: &SqlitePool, owner: i64, new: NewRecipe) -> Result<Recipe, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO recipes (user_id, title, time_minutes, price, description, link)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(owner)
    .bind(&new.title)
    .bind(new.time_minutes)
    .bind(new.price.to_string())
    .bind(&new.description)
    .bind(&new.link)
    .execute(&mut *tx)
    .await?;
    let id = result.last_insert_rowid();

    if let Some(names) = &new.tags {
        attributes::replace_recipe_links(&mut tx, AttributeKind::Tag, owner, id, names).await?;
    }
    if let Some(names) = &new.ingredients {
        attributes::replace_recipe_links(&mut tx, AttributeKind::Ingredient, owner, id, names)
            .await?;
    }

    let recipe = fetch_in_tx(&mut tx, owner, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(recipe)
}

/// Apply changes to an owned recipe. The owner column is never part of the
/// UPDATE, so ownership cannot change. Association replacement happens in
/// the same transaction; a failure rolls back to the prior set. Returns
/// `None` when the row is absent or owned by someone else.
pub async fn update(
    pool: &SqlitePool,
    owner: i64,
    id: i64,
    changes: RecipeChanges,
) -> Result<Option<Recipe>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = fetch_in_tx(&mut tx, owner, id).await? else {
        return Ok(None);
    };

    let title = changes.title.unwrap_or(current.title);
    let time_minutes = changes.time_minutes.unwrap_or(current.time_minutes);
    let price = changes.price.unwrap_or(current.price);
    let description = changes.description.unwrap_or(current.description);
    let link = changes.link.unwrap_or(current.link);

    sqlx::query(
        "UPDATE recipes SET title = ?, time_minutes = ?, price = ?, description = ?, link = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(&title)
    .bind(time_minutes)
    .bind(price.to_string())
    .bind(&description)
    .bind(&link)
    .bind(id)
    .bind(owner)
    .execute(&mut *tx)
    .await?;

    if let Some(names) = &changes.tags {
        attributes::replace_recipe_links(&mut tx, AttributeKind::Tag, owner, id, names).await?;
    }
    if let Some(names) = &changes.ingredients {
        attributes::replace_recipe_links(&mut tx, AttributeKind::Ingredient, owner, id, names)
            .await?;
    }

    let updated = fetch_in_tx(&mut tx, owner, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(Some(updated))
}

/// Delete an owned recipe and its association rows. Returns the stored
/// image path (if any) so the caller can remove the file; `None` when the
/// row is absent or owned by someone else.
pub async fn delete(
    pool: &SqlitePool,
    owner: i64,
    id: i64,
) -> Result<Option<Option<String>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = fetch_in_tx(&mut tx, owner, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(current.image))
}

/// Point an owned recipe at a newly stored image file. Returns false when
/// the row is absent or owned by someone else.
pub async fn set_image(
    pool: &SqlitePool,
    owner: i64,
    id: i64,
    image: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE recipes SET image = ? WHERE id = ? AND user_id = ?")
        .bind(image)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
