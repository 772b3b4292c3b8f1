use thiserror::Error;

use crate::core::CoreError;
use crate::event::EventError;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The player has never finished a game
    #[error("Statistics not found for player {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    /// The finished game could not be loaded
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<CoreError> for StatsError {
    fn from(err: CoreError) -> Self {
        StatsError::Upstream(err.to_string())
    }
}

impl From<sqlx::Error> for StatsError {
    fn from(err: sqlx::Error) -> Self {
        StatsError::Repository(err.to_string())
    }
}

impl From<StatsError> for EventError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Upstream(msg) => EventError::Upstream(msg),
            other => EventError::Handler(other.to_string()),
        }
    }
}
