use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, TOKEN_TYPE_ACCESS};
use crate::db::models::User;
use crate::db::users;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated principal, injected into the request extensions once the
/// bearer token checks out against an active user row.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Bearer-token middleware for every protected route. Verifies the access
/// token signature and expiry, then loads the user so deactivated or
/// deleted accounts lose access immediately rather than at token expiry.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let claims = auth::decode_token(&token, TOKEN_TYPE_ACCESS, &state.config.security)
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired"))?;

    let user = users::find_active_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    request.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}
