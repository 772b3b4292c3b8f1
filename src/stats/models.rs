use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::calculators::STARTING_ELO;

/// One persisted statistics snapshot
///
/// Each row carries the player's full cumulative standing as of one finished
/// game, so the newest row alone describes the player.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PlayerStats {
    pub id: i64,
    pub player_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_wins: i32,
    pub game_count: i32,
    pub winrate: f64,
    pub rolling_winrate: f64,
    /// Cumulative minutes played
    pub game_duration: i32,
    pub streak: i32,
    pub elo: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A snapshot waiting to be appended; the store stamps `timestamp` with
/// "now" when it is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayerStats {
    pub player_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub total_wins: i32,
    pub game_count: i32,
    pub winrate: f64,
    pub rolling_winrate: f64,
    pub game_duration: i32,
    pub streak: i32,
    pub elo: i32,
}

impl NewPlayerStats {
    /// Standing of a player who has never finished a game
    pub fn baseline(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            timestamp: None,
            total_wins: 0,
            game_count: 0,
            winrate: 0.0,
            rolling_winrate: 0.0,
            game_duration: 0,
            streak: 0,
            elo: STARTING_ELO,
        }
    }
}

impl From<PlayerStats> for NewPlayerStats {
    fn from(stats: PlayerStats) -> Self {
        Self {
            player_id: stats.player_id,
            timestamp: None,
            total_wins: stats.total_wins,
            game_count: stats.game_count,
            winrate: stats.winrate,
            rolling_winrate: stats.rolling_winrate,
            game_duration: stats.game_duration,
            streak: stats.streak,
            elo: stats.elo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatsResponse {
    pub player_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_wins: i32,
    pub winrate: f64,
    pub rolling_winrate: f64,
    pub game_count: i32,
    pub game_duration: i32,
    pub streak: i32,
    pub elo: i32,
}

impl From<PlayerStats> for PlayerStatsResponse {
    fn from(stats: PlayerStats) -> Self {
        Self {
            player_id: stats.player_id,
            timestamp: stats.timestamp,
            total_wins: stats.total_wins,
            winrate: stats.winrate,
            rolling_winrate: stats.rolling_winrate,
            game_count: stats.game_count,
            game_duration: stats.game_duration,
            streak: stats.streak,
            elo: stats.elo,
        }
    }
}
