use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::models::User;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(user: &User, token_type: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            token_type: token_type.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Access/refresh token pair issued on successful authentication.
#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT secret is not configured")]
    InvalidSecret,

    #[error("password hashing error: {0}")]
    Hashing(String),
}

pub fn issue_token_pair(user: &User, security: &SecurityConfig) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: issue_access_token(user, security)?,
        refresh: sign(
            Claims::new(
                user,
                TOKEN_TYPE_REFRESH,
                Duration::days(security.refresh_token_days),
            ),
            security,
        )?,
    })
}

pub fn issue_access_token(user: &User, security: &SecurityConfig) -> Result<String, AuthError> {
    sign(
        Claims::new(
            user,
            TOKEN_TYPE_ACCESS,
            Duration::minutes(security.access_token_minutes),
        ),
        security,
    )
}

fn sign(claims: Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a token's signature and expiry and require the expected type,
/// so a refresh token can never be used as an access credential.
pub fn decode_token(
    token: &str,
    expected_type: &str,
    security: &SecurityConfig,
) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    if token_data.claims.token_type != expected_type {
        return Err(AuthError::InvalidToken(format!(
            "expected {} token",
            expected_type
        )));
    }

    Ok(token_data.claims)
}

/// Hash a password with Argon2id. Runs on the blocking pool because Argon2
/// is deliberately CPU-intensive.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Normalize an email address: the domain portion is lower-cased, the local
/// part is stored exactly as supplied.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Basic structural email validation
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Enter a valid email address.".to_string());
    }

    Ok(())
}
