use thiserror::Error;

use crate::core::CoreError;
use crate::event::EventError;

#[derive(Debug, Error)]
pub enum OpponentError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("A player cannot be paired with themselves")]
    SelfPair,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<sqlx::Error> for OpponentError {
    fn from(err: sqlx::Error) -> Self {
        OpponentError::Repository(err.to_string())
    }
}

impl From<CoreError> for OpponentError {
    fn from(err: CoreError) -> Self {
        OpponentError::Upstream(err.to_string())
    }
}

impl From<OpponentError> for EventError {
    fn from(err: OpponentError) -> Self {
        match err {
            OpponentError::Upstream(msg) => EventError::Upstream(msg),
            other => EventError::Handler(other.to_string()),
        }
    }
}
