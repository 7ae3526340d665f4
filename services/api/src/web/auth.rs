//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration and user/admin login, plus
//! the bearer-token claims shared with the auth middleware.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::protocol::{AppJson, Envelope};
use crate::web::state::AppState;

/// End-user tokens live for a day; back-office tokens for an hour.
pub const USER_TOKEN_HOURS: i64 = 24;
pub const ADMIN_TOKEN_HOURS: i64 = 1;

//=========================================================================================
// Token Claims
//=========================================================================================

/// The signed bearer-token payload: the acting account, its role, and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64,
}

/// Signs a token for the given account, expiring after `ttl_hours`.
pub fn issue_token(
    account_id: Uuid,
    is_admin: bool,
    ttl_hours: i64,
    secret: &str,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: account_id,
        is_admin,
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Verifies a token's signature and expiry and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("failed to hash password".to_string())
        })
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// POST /auth/register - Create a new end-user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username or email already taken"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::Validation(
            "username and email must not be empty".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(req.username.trim(), req.email.trim(), &password_hash)
        .await?;

    let token = issue_token(user.id, false, USER_TOKEN_HOURS, &state.config.token_secret)?;
    let response = AuthResponse {
        user_id: user.id,
        username: user.username,
        token,
    };
    Ok((StatusCode::CREATED, Json(Envelope::ok(response))))
}

/// POST /auth/login - Login with an end-user account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state
        .store
        .user_by_username(&req.username)
        .await
        .map_err(|_| ApiError::Unauthorized("invalid username or password".to_string()))?;

    if !verify_password(&req.password, &credentials.password_hash)? {
        return Err(ApiError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    }

    state.store.touch_last_login(credentials.id).await?;

    let token = issue_token(
        credentials.id,
        false,
        USER_TOKEN_HOURS,
        &state.config.token_secret,
    )?;
    let response = AuthResponse {
        user_id: credentials.id,
        username: credentials.username,
        token,
    };
    Ok((StatusCode::OK, Json(Envelope::ok(response))))
}

/// POST /auth/admin/login - Login with a back-office account
#[utoipa::path(
    post,
    path = "/auth/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn admin_login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state
        .store
        .admin_by_username(&req.username)
        .await
        .map_err(|_| ApiError::Unauthorized("invalid username or password".to_string()))?;

    if !verify_password(&req.password, &credentials.password_hash)? {
        return Err(ApiError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    }

    let token = issue_token(
        credentials.id,
        true,
        ADMIN_TOKEN_HOURS,
        &state.config.token_secret,
    )?;
    let response = AuthResponse {
        user_id: credentials.id,
        username: credentials.username,
        token,
    };
    Ok((StatusCode::OK, Json(Envelope::ok(response))))
}
