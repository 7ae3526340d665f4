//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::auth::{verify_token, Claims};
use crate::web::state::AppState;

fn bearer_token(req: &Request) -> Result<&str, ApiError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))
}

/// Middleware that validates the bearer token and stores its claims in the
/// request extensions for handlers to use. Missing, invalid, or expired
/// tokens are rejected with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = authenticate(&state, &req).map_err(IntoResponse::into_response)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware for the back-office routes: the token must additionally carry
/// the admin role, otherwise the request is rejected with 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = authenticate(&state, &req).map_err(IntoResponse::into_response)?;
    if !claims.is_admin {
        return Err(
            ApiError::Forbidden("this route requires an admin token".to_string()).into_response(),
        );
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims, ApiError> {
    let token = bearer_token(req)?;
    verify_token(token, &state.config.token_secret)
}
