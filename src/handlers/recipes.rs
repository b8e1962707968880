//! Recipe endpoints: CRUD, list filtering, and image upload.

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::api::extract::ApiJson;
use crate::api::format::{self, RecipeDetail, RecipeSummary};
use crate::db::attributes::{self, AttributeKind};
use crate::db::models::Recipe;
use crate::db::recipes::{self, NewRecipe, RecipeChanges, RecipeFilter};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list).post(create))
        .route(
            "/recipes/:id/",
            get(show).put(replace).patch(modify).delete(remove),
        )
        .route("/recipes/:id/upload-image/", post(upload_image))
}

/// Nested association reference in recipe payloads: `{"name": "Thai"}`.
#[derive(Debug, Deserialize)]
pub struct NameRef {
    pub name: String,
}

fn names(refs: Option<Vec<NameRef>>) -> Option<Vec<String>> {
    refs.map(|list| list.into_iter().map(|r| r.name).collect())
}

#[derive(Debug, Deserialize)]
struct RecipeListQuery {
    tags: Option<String>,
    ingredients: Option<String>,
}

/// Parse a `tags=1,2,3` style query value into ids.
fn parse_id_list(field: &'static str, raw: Option<&str>) -> Result<Vec<i64>, ApiError> {
    let Some(raw) = raw else {
        return Ok(vec![]);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                ApiError::field_error(field, "Expected a comma-separated list of integer ids.")
            })
        })
        .collect()
}

/// GET /recipes/ - the caller's recipes, newest first, optionally filtered
async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<RecipeListQuery>,
) -> ApiResult<Vec<RecipeSummary>> {
    let filter = RecipeFilter {
        tag_ids: parse_id_list("tags", query.tags.as_deref())?,
        ingredient_ids: parse_id_list("ingredients", query.ingredients.as_deref())?,
    };

    let listed = recipes::list(&state.pool, current.id, &filter).await?;
    Ok(ApiResponse::success(
        listed.iter().map(format::recipe_summary).collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct RecipeCreateRequest {
    title: String,
    time_minutes: i64,
    price: Decimal,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    tags: Option<Vec<NameRef>>,
    ingredients: Option<Vec<NameRef>>,
}

/// POST /recipes/ - create a recipe owned by the caller
async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<RecipeCreateRequest>,
) -> ApiResult<RecipeDetail> {
    require_title(&body.title)?;

    let recipe = recipes::create(
        &state.pool,
        current.id,
        NewRecipe {
            title: body.title,
            time_minutes: body.time_minutes,
            price: body.price,
            description: body.description,
            link: body.link,
            tags: names(body.tags),
            ingredients: names(body.ingredients),
        },
    )
    .await?;

    Ok(ApiResponse::created(detail(&state.pool, &recipe).await?))
}

/// GET /recipes/:id/ - detail representation
async fn show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<RecipeDetail> {
    let recipe = recipes::find(&state.pool, current.id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::success(detail(&state.pool, &recipe).await?))
}

#[derive(Debug, Deserialize)]
struct RecipePutRequest {
    title: String,
    time_minutes: i64,
    price: Decimal,
    description: Option<String>,
    link: Option<String>,
    tags: Option<Vec<NameRef>>,
    ingredients: Option<Vec<NameRef>>,
}

/// PUT /recipes/:id/ - full update; omitted optional text fields reset to
/// empty, omitted association lists are left untouched
async fn replace(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<RecipePutRequest>,
) -> ApiResult<RecipeDetail> {
    require_title(&body.title)?;

    let changes = RecipeChanges {
        title: Some(body.title),
        time_minutes: Some(body.time_minutes),
        price: Some(body.price),
        description: Some(body.description.unwrap_or_default()),
        link: Some(body.link.unwrap_or_default()),
        tags: names(body.tags),
        ingredients: names(body.ingredients),
    };

    let recipe = recipes::update(&state.pool, current.id, id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::success(detail(&state.pool, &recipe).await?))
}

#[derive(Debug, Deserialize)]
struct RecipePatchRequest {
    title: Option<String>,
    time_minutes: Option<i64>,
    price: Option<Decimal>,
    description: Option<String>,
    link: Option<String>,
    tags: Option<Vec<NameRef>>,
    ingredients: Option<Vec<NameRef>>,
}

/// PATCH /recipes/:id/ - partial update; a supplied `tags`/`ingredients`
/// list replaces the whole association set
async fn modify(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<RecipePatchRequest>,
) -> ApiResult<RecipeDetail> {
    if let Some(title) = body.title.as_deref() {
        require_title(title)?;
    }

    let changes = RecipeChanges {
        title: body.title,
        time_minutes: body.time_minutes,
        price: body.price,
        description: body.description,
        link: body.link,
        tags: names(body.tags),
        ingredients: names(body.ingredients),
    };

    let recipe = recipes::update(&state.pool, current.id, id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::success(detail(&state.pool, &recipe).await?))
}

/// DELETE /recipes/:id/ - remove the recipe, its links, and its image file
async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let image = recipes::delete(&state.pool, current.id, id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(relative) = image {
        state.media.remove(&relative).await;
    }

    Ok(ApiResponse::no_content())
}

/// POST /recipes/:id/upload-image/ - attach an image from a multipart form.
/// The previous image file is removed only after the new one is stored and
/// recorded, so a rejected payload leaves the prior image intact.
async fn upload_image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<RecipeDetail> {
    let recipe = recipes::find(&state.pool, current.id, id)
        .await?
        .ok_or_else(not_found)?;

    let mut payload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(e.to_string(), None))?
    {
        if field.name() == Some("image") {
            payload = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(e.to_string(), None))?,
            );
        }
    }

    let payload =
        payload.ok_or_else(|| ApiError::field_error("image", "No image file was submitted."))?;

    let relative = state.media.store_recipe_image(&payload).await?;
    if !recipes::set_image(&state.pool, current.id, id, &relative).await? {
        state.media.remove(&relative).await;
        return Err(not_found());
    }

    if let Some(previous) = recipe.image.as_deref() {
        state.media.remove(previous).await;
    }

    let updated = recipes::find(&state.pool, current.id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::success(detail(&state.pool, &updated).await?))
}

async fn detail(pool: &SqlitePool, recipe: &Recipe) -> Result<RecipeDetail, ApiError> {
    let tags = attributes::for_recipe(pool, AttributeKind::Tag, recipe.id).await?;
    let ingredients = attributes::for_recipe(pool, AttributeKind::Ingredient, recipe.id).await?;
    Ok(format::recipe_detail(recipe, &tags, &ingredients))
}

fn require_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::field_error("title", "This field may not be blank."));
    }
    Ok(())
}

fn not_found() -> ApiError {
    ApiError::not_found("Recipe not found")
}
