//! services/api/src/web/actions.rs
//!
//! The like/save/dislike endpoints. The handlers validate shape and ownership
//! and delegate to the store, which applies the set mutation and the counter
//! mutation as one transactional unit.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use cinelog_core::domain::{Movie, MovieAction};

use crate::error::ApiError;
use crate::web::auth::Claims;
use crate::web::protocol::{AppJson, Envelope};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Body shared by the add and remove endpoints. The action type is kept as a
/// string so an unknown value produces the envelope's 400, before any store
/// access.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieActionRequest {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub action_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieActionResponse {
    #[schema(value_type = Object)]
    pub movie: Movie,
}

fn parse_request(
    claims: &Claims,
    req: &MovieActionRequest,
) -> Result<MovieAction, ApiError> {
    let action = req
        .action_type
        .parse::<MovieAction>()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    if claims.sub != req.user_id {
        return Err(ApiError::Forbidden(
            "cannot modify another user's actions".to_string(),
        ));
    }
    Ok(action)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users/actions - Add a like/save/dislike for a movie.
///
/// Idempotent: adding an action already present leaves the set and the
/// movie's counter unchanged.
#[utoipa::path(
    post,
    path = "/users/actions",
    request_body = MovieActionRequest,
    responses(
        (status = 200, description = "Action applied; updated movie returned", body = MovieActionResponse),
        (status = 400, description = "Invalid action type"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Acting on another user's behalf"),
        (status = 404, description = "User or movie not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn add_action_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<MovieActionRequest>,
) -> Result<Json<Envelope<MovieActionResponse>>, ApiError> {
    let action = parse_request(&claims, &req)?;
    let movie = state
        .store
        .apply_action(req.user_id, req.movie_id, action)
        .await?;
    Ok(Json(Envelope::ok(MovieActionResponse { movie })))
}

/// POST /users/actions/remove - Remove a like/save/dislike for a movie.
///
/// Removing an action that is not present is a no-op; the counter never
/// drops below zero.
#[utoipa::path(
    post,
    path = "/users/actions/remove",
    request_body = MovieActionRequest,
    responses(
        (status = 200, description = "Action removed; updated movie returned", body = MovieActionResponse),
        (status = 400, description = "Invalid action type"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Acting on another user's behalf"),
        (status = 404, description = "User or movie not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn remove_action_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<MovieActionRequest>,
) -> Result<Json<Envelope<MovieActionResponse>>, ApiError> {
    let action = parse_request(&claims, &req)?;
    let movie = state
        .store
        .remove_action(req.user_id, req.movie_id, action)
        .await?;
    Ok(Json(Envelope::ok(MovieActionResponse { movie })))
}

//=========================================================================================
// Tests
//=========================================================================================
