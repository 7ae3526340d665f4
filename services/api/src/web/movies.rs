//! services/api/src/web/movies.rs
//!
//! The public movie read surface: one detail endpoint joining the movie
//! document with its cast and per-country earnings.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use cinelog_core::domain::{CastMember, CountryEarnings, Movie};

use crate::error::ApiError;
use crate::web::protocol::Envelope;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetailResponse {
    #[schema(value_type = Object)]
    pub movie: Movie,
    #[schema(value_type = Vec<Object>)]
    pub cast: Vec<CastMember>,
    #[schema(value_type = Vec<Object>)]
    pub earnings_by_country: Vec<CountryEarnings>,
}

/// GET /movies/{id} - A movie with its cast and country earnings.
#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = Uuid, Path, description = "Movie identifier")),
    responses(
        (status = 200, description = "Movie detail", body = MovieDetailResponse),
        (status = 404, description = "Movie not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn movie_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<Uuid>,
) -> Result<Json<Envelope<MovieDetailResponse>>, ApiError> {
    let movie = state.store.movie_by_id(movie_id).await?;
    let cast = state.store.cast_for_movie(movie_id).await?;
    let earnings_by_country = state.store.earnings_for_movie(movie_id).await?;
    Ok(Json(Envelope::ok(MovieDetailResponse {
        movie,
        cast,
        earnings_by_country,
    })))
}
