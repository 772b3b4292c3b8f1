mod elo;
mod streak;
mod winrate;

pub use elo::{expected_score, multiplayer_elo, OpponentResult, K_FACTOR, STARTING_ELO};
pub use streak::{next_streak, persisted_streak};
pub use winrate::{rolling_winrate, winrate, ROLLING_WINDOW};

use super::models::{NewPlayerStats, PlayerStats};

/// What one player did in one finished game
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub position: i32,
    /// Declared game duration in minutes
    pub duration: Option<i32>,
    /// Number of rankings in the game, guests included
    pub participant_count: usize,
    /// Pre-game ratings and positions of the registered opponents
    pub opponents: Vec<OpponentResult>,
}

impl GameOutcome {
    pub fn won(&self) -> bool {
        self.position == 1
    }
}

/// Derives the next cumulative snapshot from the player's pre-game standing
///
/// `recent` is the player's prior history, newest first, truncated to
/// [`ROLLING_WINDOW`] rows.
pub fn next_snapshot(
    current: &NewPlayerStats,
    outcome: &GameOutcome,
    recent: &[PlayerStats],
) -> NewPlayerStats {
    let won = outcome.won();
    let game_count = current.game_count + 1;
    let total_wins = current.total_wins + i32::from(won);

    NewPlayerStats {
        player_id: current.player_id.clone(),
        timestamp: None,
        total_wins,
        game_count,
        winrate: winrate(total_wins, game_count),
        rolling_winrate: rolling_winrate(recent, won),
        game_duration: current.game_duration + outcome.duration.unwrap_or(0),
        streak: persisted_streak(current.streak, won),
        elo: multiplayer_elo(
            current.elo,
            outcome.position,
            &outcome.opponents,
            outcome.participant_count,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heads_up(position: i32, duration: Option<i32>) -> GameOutcome {
        GameOutcome {
            position,
            duration,
            participant_count: 2,
            opponents: vec![OpponentResult {
                elo: STARTING_ELO,
                position: if position == 1 { 2 } else { 1 },
            }],
        }
    }

    #[test]
    fn first_win_from_baseline() {
        let current = NewPlayerStats::baseline("alice");
        let next = next_snapshot(&current, &heads_up(1, Some(40)), &[]);

        assert_eq!(next.player_id, "alice");
        assert_eq!(next.timestamp, None);
        assert_eq!(next.game_count, 1);
        assert_eq!(next.total_wins, 1);
        assert_eq!(next.winrate, 1.0);
        assert_eq!(next.rolling_winrate, 1.0);
        assert_eq!(next.game_duration, 40);
        assert_eq!(next.streak, 1);
        assert_eq!(next.elo, 1016);
    }

    #[test]
    fn loss_without_duration_keeps_minutes() {
        let current = NewPlayerStats {
            game_count: 3,
            total_wins: 2,
            game_duration: 90,
            streak: 2,
            ..NewPlayerStats::baseline("bob")
        };
        let next = next_snapshot(&current, &heads_up(2, None), &[]);

        assert_eq!(next.game_count, 4);
        assert_eq!(next.total_wins, 2);
        assert_eq!(next.winrate, 0.5);
        assert_eq!(next.game_duration, 90);
        assert_eq!(next.streak, 0);
        assert_eq!(next.elo, 984);
    }
}
