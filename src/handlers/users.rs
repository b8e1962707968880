//! Registration, token issue/refresh, and own-profile management.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::format::{self, UserOut};
use crate::auth::{self, TOKEN_TYPE_REFRESH};
use crate::config::SecurityConfig;
use crate::db;
use crate::db::users::{self, NewUser, UserChanges};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", post(register))
        .route("/token/", post(obtain_token))
        .route("/token/refresh/", post(refresh_token))
}

pub fn protected_routes() -> Router<AppState> {
    // POST /me/ falls through to the router's 405.
    Router::new().route("/me/", get(me_show).patch(me_update))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

/// POST /users/ - register a new account
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<UserOut> {
    let email = validate_new_email(&body.email)?;
    validate_password(&body.password, &state.config.security)?;

    let password_hash = auth::hash_password(body.password).await?;
    let user = users::insert(
        &state.pool,
        NewUser {
            email,
            password_hash,
            name: body.name,
            is_staff: false,
            is_superuser: false,
        },
    )
    .await
    .map_err(duplicate_email_error)?;

    Ok(ApiResponse::created(format::user_out(&user)))
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenPairOut {
    access: String,
    refresh: String,
}

/// POST /token/ - exchange credentials for an access/refresh pair
async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> ApiResult<TokenPairOut> {
    let email = auth::normalize_email(&body.email);

    let user = match users::find_by_email(&state.pool, &email).await? {
        Some(user) if user.is_active => user,
        _ => return Err(bad_credentials()),
    };

    if !auth::verify_password(body.password, user.password_hash.clone()).await? {
        return Err(bad_credentials());
    }

    let pair = auth::issue_token_pair(&user, &state.config.security)?;
    users::touch_last_login(&state.pool, user.id, Utc::now()).await?;

    Ok(ApiResponse::success(TokenPairOut {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh: String,
}

#[derive(Debug, Serialize)]
struct AccessTokenOut {
    access: String,
}

/// POST /token/refresh/ - rotate the access token
async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> ApiResult<AccessTokenOut> {
    let claims = auth::decode_token(&body.refresh, TOKEN_TYPE_REFRESH, &state.config.security)
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired"))?;

    let user = users::find_active_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    let access = auth::issue_access_token(&user, &state.config.security)?;
    Ok(ApiResponse::success(AccessTokenOut { access }))
}

/// GET /me/ - the caller's own profile
async fn me_show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<UserOut> {
    let user = users::find_active_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    Ok(ApiResponse::success(format::user_out(&user)))
}

#[derive(Debug, Deserialize)]
struct MeUpdateRequest {
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
}

/// PATCH /me/ - partial profile update; omitted fields are untouched
async fn me_update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<MeUpdateRequest>,
) -> ApiResult<UserOut> {
    let mut changes = UserChanges {
        name: body.name,
        ..UserChanges::default()
    };

    if let Some(raw) = body.email.as_deref() {
        changes.email = Some(validate_new_email(raw)?);
    }

    if let Some(password) = body.password {
        validate_password(&password, &state.config.security)?;
        changes.password_hash = Some(auth::hash_password(password).await?);
    }

    let user = users::update_profile(&state.pool, current.id, changes)
        .await
        .map_err(duplicate_email_error)?;

    Ok(ApiResponse::success(format::user_out(&user)))
}

fn validate_new_email(raw: &str) -> Result<String, ApiError> {
    auth::validate_email(raw).map_err(|msg| ApiError::field_error("email", msg))?;
    Ok(auth::normalize_email(raw))
}

fn validate_password(password: &str, security: &SecurityConfig) -> Result<(), ApiError> {
    if password.chars().count() < security.password_min_length {
        return Err(ApiError::field_error(
            "password",
            format!(
                "Ensure this field has at least {} characters.",
                security.password_min_length
            ),
        ));
    }
    Ok(())
}

fn duplicate_email_error(err: sqlx::Error) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::field_error("email", "A user with this email already exists.")
    } else {
        err.into()
    }
}

fn bad_credentials() -> ApiError {
    ApiError::unauthorized("Unable to authenticate with provided credentials")
}
