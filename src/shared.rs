use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::IdentityConfig;
use crate::opponents::{OpponentError, OpponentRepository};
use crate::stats::{StatsError, StatsService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub stats_service: Arc<StatsService>,
    pub opponent_repository: Arc<dyn OpponentRepository>,
    pub identity: IdentityConfig,
}

impl AppState {
    pub fn new(
        stats_service: Arc<StatsService>,
        opponent_repository: Arc<dyn OpponentRepository>,
        identity: IdentityConfig,
    ) -> Self {
        Self {
            stats_service,
            opponent_repository,
            identity,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Request failed on storage");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::NotFound(player_id) => {
                AppError::NotFound(format!("No statistics for player {player_id}"))
            }
            StatsError::Repository(msg) => AppError::DatabaseError(msg),
            StatsError::Upstream(msg) => {
                error!(error = %msg, "Upstream failure surfaced to HTTP");
                AppError::Internal
            }
        }
    }
}

impl From<OpponentError> for AppError {
    fn from(err: OpponentError) -> Self {
        match err {
            OpponentError::Repository(msg) => AppError::DatabaseError(msg),
            OpponentError::SelfPair => AppError::BadRequest(OpponentError::SelfPair.to_string()),
            OpponentError::Upstream(msg) => {
                error!(error = %msg, "Upstream failure surfaced to HTTP");
                AppError::Internal
            }
        }
    }
}
