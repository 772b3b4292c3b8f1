use thiserror::Error;

use super::models::{GameId, RankingId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Ranking {ranking_id} not found in game {game_id}")]
    RankingNotFound {
        game_id: GameId,
        ranking_id: RankingId,
    },

    #[error("Repository error: {0}")]
    Repository(String),
}
