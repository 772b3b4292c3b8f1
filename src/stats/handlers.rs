use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::models::PlayerStatsResponse;
use crate::auth::CallerIdentity;
use crate::pagination::{PaginatedResult, Pagination, PaginationQuery};
use crate::shared::{AppError, AppState};

fn caller(identity: Option<Extension<CallerIdentity>>) -> Result<CallerIdentity, AppError> {
    identity
        .map(|Extension(identity)| identity)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// GET /statistics/v1/players
///
/// Latest snapshot of every player, highest rating first
#[instrument(name = "list_player_stats", skip(state))]
pub async fn list_player_stats(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResult<PlayerStatsResponse>>, AppError> {
    let result = state.stats_service.leaderboard(Pagination::from(query)).await?;

    info!(
        returned = result.items.len(),
        total = result.total_count,
        "Leaderboard listed"
    );
    Ok(Json(result.map(PlayerStatsResponse::from)))
}

/// GET /statistics/v1/players/:player_id
#[instrument(name = "get_player_stats", skip(state))]
pub async fn get_player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    let stats = state.stats_service.latest_for_player(&player_id).await?;
    Ok(Json(stats.into()))
}

/// GET /statistics/v1/players/:player_id/timeseries
#[instrument(name = "get_player_timeseries", skip(state))]
pub async fn get_player_timeseries(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResult<PlayerStatsResponse>>, AppError> {
    let result = state
        .stats_service
        .time_series_for_player(&player_id, query.into())
        .await?;
    Ok(Json(result.map(PlayerStatsResponse::from)))
}

/// GET /statistics/v1/me
#[instrument(name = "get_my_stats", skip(state, identity))]
pub async fn get_my_stats(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    let caller = caller(identity)?;
    let stats = state
        .stats_service
        .latest_for_player(&caller.player_id)
        .await?;
    Ok(Json(stats.into()))
}

/// GET /statistics/v1/me/timeseries
#[instrument(name = "get_my_timeseries", skip(state, identity))]
pub async fn get_my_timeseries(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResult<PlayerStatsResponse>>, AppError> {
    let caller = caller(identity)?;
    let result = state
        .stats_service
        .time_series_for_player(&caller.player_id, query.into())
        .await?;
    Ok(Json(result.map(PlayerStatsResponse::from)))
}
