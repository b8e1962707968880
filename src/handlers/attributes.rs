//! Tag and ingredient endpoints. Both resources share one implementation,
//! parameterized by `AttributeKind`, with thin per-resource wrappers bound
//! into the router.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Extension, Router};
use serde::Deserialize;

use crate::api::extract::ApiJson;
use crate::api::format::{self, AttributeOut};
use crate::db;
use crate::db::attributes::{self, AttributeKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    // Detail GET is not part of the surface, so it falls through to 405.
    Router::new()
        .route("/tags/", get(list_tags).post(create_tag))
        .route(
            "/tags/:id/",
            put(replace_tag).patch(modify_tag).delete(delete_tag),
        )
        .route("/ingredients/", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id/",
            put(replace_ingredient)
                .patch(modify_ingredient)
                .delete(delete_ingredient),
        )
}

#[derive(Debug, Deserialize)]
struct AttributeListQuery {
    assigned_only: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeRequest {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AttributePatchRequest {
    name: Option<String>,
}

fn parse_assigned_only(raw: Option<&str>) -> Result<bool, ApiError> {
    match raw {
        None => Ok(false),
        Some(value) => match value.trim().parse::<i64>() {
            Ok(n) => Ok(n != 0),
            Err(_) => Err(ApiError::field_error("assigned_only", "Expected 0 or 1.")),
        },
    }
}

async fn list_of(
    kind: AttributeKind,
    state: AppState,
    current: CurrentUser,
    query: AttributeListQuery,
) -> ApiResult<Vec<AttributeOut>> {
    let assigned_only = parse_assigned_only(query.assigned_only.as_deref())?;
    let rows = attributes::list(&state.pool, kind, current.id, assigned_only).await?;
    Ok(ApiResponse::success(format::attributes_out(&rows)))
}

async fn create_of(
    kind: AttributeKind,
    state: AppState,
    current: CurrentUser,
    body: AttributeRequest,
) -> ApiResult<AttributeOut> {
    require_name(&body.name)?;

    let row = attributes::create(&state.pool, kind, current.id, &body.name)
        .await
        .map_err(|e| duplicate_name_error(kind, e))?;

    Ok(ApiResponse::created(format::attribute_out(&row)))
}

async fn replace_of(
    kind: AttributeKind,
    state: AppState,
    current: CurrentUser,
    id: i64,
    body: AttributeRequest,
) -> ApiResult<AttributeOut> {
    require_name(&body.name)?;

    let row = attributes::update(&state.pool, kind, current.id, id, &body.name)
        .await
        .map_err(|e| duplicate_name_error(kind, e))?
        .ok_or_else(|| not_found(kind))?;

    Ok(ApiResponse::success(format::attribute_out(&row)))
}

async fn modify_of(
    kind: AttributeKind,
    state: AppState,
    current: CurrentUser,
    id: i64,
    body: AttributePatchRequest,
) -> ApiResult<AttributeOut> {
    let row = match body.name {
        Some(name) => {
            require_name(&name)?;
            attributes::update(&state.pool, kind, current.id, id, &name)
                .await
                .map_err(|e| duplicate_name_error(kind, e))?
        }
        // Nothing to change; still report 404 for unowned rows.
        None => attributes::find(&state.pool, kind, current.id, id).await?,
    }
    .ok_or_else(|| not_found(kind))?;

    Ok(ApiResponse::success(format::attribute_out(&row)))
}

async fn delete_of(
    kind: AttributeKind,
    state: AppState,
    current: CurrentUser,
    id: i64,
) -> ApiResult<()> {
    if !attributes::delete(&state.pool, kind, current.id, id).await? {
        return Err(not_found(kind));
    }
    Ok(ApiResponse::no_content())
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::field_error("name", "This field may not be blank."));
    }
    Ok(())
}

fn duplicate_name_error(kind: AttributeKind, err: sqlx::Error) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::field_error(
            "name",
            format!("A {} with this name already exists.", kind.label()),
        )
    } else {
        err.into()
    }
}

fn not_found(kind: AttributeKind) -> ApiError {
    match kind {
        AttributeKind::Tag => ApiError::not_found("Tag not found"),
        AttributeKind::Ingredient => ApiError::not_found("Ingredient not found"),
    }
}

/// GET /tags/ - the caller's tags, name ascending
async fn list_tags(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<AttributeListQuery>,
) -> ApiResult<Vec<AttributeOut>> {
    list_of(AttributeKind::Tag, state, current, query).await
}

/// POST /tags/ - create a tag owned by the caller
async fn create_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<AttributeRequest>,
) -> ApiResult<AttributeOut> {
    create_of(AttributeKind::Tag, state, current, body).await
}

/// PUT /tags/:id/
async fn replace_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AttributeRequest>,
) -> ApiResult<AttributeOut> {
    replace_of(AttributeKind::Tag, state, current, id, body).await
}

/// PATCH /tags/:id/
async fn modify_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AttributePatchRequest>,
) -> ApiResult<AttributeOut> {
    modify_of(AttributeKind::Tag, state, current, id, body).await
}

/// DELETE /tags/:id/
async fn delete_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    delete_of(AttributeKind::Tag, state, current, id).await
}

/// GET /ingredients/ - the caller's ingredients, name ascending
async fn list_ingredients(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<AttributeListQuery>,
) -> ApiResult<Vec<AttributeOut>> {
    list_of(AttributeKind::Ingredient, state, current, query).await
}

/// POST /ingredients/ - create an ingredient owned by the caller
async fn create_ingredient(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<AttributeRequest>,
) -> ApiResult<AttributeOut> {
    create_of(AttributeKind::Ingredient, state, current, body).await
}

/// PUT /ingredients/:id/
async fn replace_ingredient(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AttributeRequest>,
) -> ApiResult<AttributeOut> {
    replace_of(AttributeKind::Ingredient, state, current, id, body).await
}

/// PATCH /ingredients/:id/
async fn modify_ingredient(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AttributePatchRequest>,
) -> ApiResult<AttributeOut> {
    modify_of(AttributeKind::Ingredient, state, current, id, body).await
}

/// DELETE /ingredients/:id/
async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    delete_of(AttributeKind::Ingredient, state, current, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_only_parsing() {
        assert!(!parse_assigned_only(None).expect("absent"));
        assert!(!parse_assigned_only(Some("0")).expect("zero"));
        assert!(parse_assigned_only(Some("1")).expect("one"));
        assert!(parse_assigned_only(Some("2")).expect("nonzero"));
        assert!(parse_assigned_only(Some("true")).is_err());
        assert!(parse_assigned_only(Some("")).is_err());
    }
}
