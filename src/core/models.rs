use serde::{Deserialize, Serialize};

pub type GameId = u64;
pub type RankingId = u64;

/// A recorded match as seen by the statistics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub creator_id: Option<String>,
    /// Declared duration in minutes
    pub duration: Option<i32>,
    pub rankings: Vec<Ranking>,
    pub finished: bool,
}

/// One participant's placement in a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub id: RankingId,
    /// `None` for guests without an account; they never get statistics
    pub player_id: Option<String>,
    /// 1 is the winner; positions are distinct within a game
    pub position: i32,
}

impl Ranking {
    pub fn is_winner(&self) -> bool {
        self.position == 1
    }
}

/// Ranking data supplied when a game is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRanking {
    pub player_id: Option<String>,
    pub position: i32,
}

impl NewRanking {
    pub fn player(player_id: impl Into<String>, position: i32) -> Self {
        Self {
            player_id: Some(player_id.into()),
            position,
        }
    }

    pub fn guest(position: i32) -> Self {
        Self {
            player_id: None,
            position,
        }
    }
}

impl Game {
    pub fn ranking_ids(&self) -> Vec<RankingId> {
        self.rankings.iter().map(|r| r.id).collect()
    }

    /// Player identifiers of registered participants, in ranking order
    pub fn player_ids(&self) -> Vec<String> {
        self.rankings
            .iter()
            .filter_map(|r| r.player_id.clone())
            .collect()
    }
}
