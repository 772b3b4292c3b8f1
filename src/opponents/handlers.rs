use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::models::OpponentCount;
use crate::auth::CallerIdentity;
use crate::pagination::{PaginatedResult, Pagination, PaginationQuery};
use crate::shared::{AppError, AppState};

async fn list_opponents(
    state: &AppState,
    player_id: &str,
    pagination: Pagination,
) -> Result<PaginatedResult<OpponentCount>, AppError> {
    let (items, total) = state
        .opponent_repository
        .opponents_of(player_id, pagination.limit(), pagination.offset())
        .await?;

    info!(
        player_id,
        returned = items.len(),
        total,
        "Opponents listed"
    );
    Ok(PaginatedResult::new(items, total, pagination))
}

/// GET /opponent/v1/opponents
///
/// Opponents of the calling player, most shared games first
#[instrument(name = "get_my_opponents", skip(state, identity))]
pub async fn get_my_opponents(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResult<OpponentCount>>, AppError> {
    let Extension(caller) = identity
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    Ok(Json(
        list_opponents(&state, &caller.player_id, query.into()).await?,
    ))
}

/// GET /opponent/v1/players/:player_id/opponents
#[instrument(name = "get_player_opponents", skip(state))]
pub async fn get_player_opponents(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResult<OpponentCount>>, AppError> {
    Ok(Json(list_opponents(&state, &player_id, query.into()).await?))
}
