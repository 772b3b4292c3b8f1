use mtg_tracker::core::{Game, NewRanking};

use super::setup::TestSetup;

// ============================================================================
// Game Setup Utilities
// ============================================================================

/// Describes a game seat by seat; `create` registers it with the core
/// registry, which publishes `game.created`
pub struct GameBuilder {
    creator_id: Option<String>,
    duration: Option<i32>,
    rankings: Vec<NewRanking>,
}

#[allow(dead_code)]
impl GameBuilder {
    pub fn new() -> Self {
        Self {
            creator_id: None,
            duration: None,
            rankings: vec![],
        }
    }

    /// Players finish in the listed order, first one wins
    pub fn with_finishing_order(mut self, players: &[&str]) -> Self {
        let start = self.rankings.len() as i32;
        for (i, player) in players.iter().enumerate() {
            self.rankings
                .push(NewRanking::player(*player, start + i as i32 + 1));
        }
        self
    }

    pub fn player(mut self, player_id: &str, position: i32) -> Self {
        self.rankings.push(NewRanking::player(player_id, position));
        self
    }

    pub fn guest(mut self, position: i32) -> Self {
        self.rankings.push(NewRanking::guest(position));
        self
    }

    pub fn duration(mut self, minutes: i32) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn created_by(mut self, player_id: &str) -> Self {
        self.creator_id = Some(player_id.to_string());
        self
    }

    pub async fn create(self, setup: &TestSetup) -> Game {
        setup
            .core
            .create_game(self.creator_id, self.duration, self.rankings)
            .await
    }
}
