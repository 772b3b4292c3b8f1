use crate::stats::models::PlayerStats;

pub const ROLLING_WINDOW: usize = 10;

/// Lifetime win rate; zero before the first game
pub fn winrate(total_wins: i32, game_count: i32) -> f64 {
    if game_count == 0 {
        return 0.0;
    }
    f64::from(total_wins) / f64::from(game_count)
}

/// Approximate win rate over the last [`ROLLING_WINDOW`] snapshots
///
/// `recent` holds up to `ROLLING_WINDOW` prior snapshots, newest first. With a
/// full window the wins are the growth of `total_wins` between the newest and
/// the oldest snapshot in the window, plus the game being recorded. With a
/// partial window the newest lifetime total is used over every game so far.
pub fn rolling_winrate(recent: &[PlayerStats], won: bool) -> f64 {
    let current = i32::from(won);

    if recent.len() >= ROLLING_WINDOW {
        let newest = &recent[0];
        let oldest = &recent[ROLLING_WINDOW - 1];
        let wins = newest.total_wins - oldest.total_wins + current;
        return f64::from(wins) / ROLLING_WINDOW as f64;
    }

    let wins = recent.first().map(|s| s.total_wins).unwrap_or(0) + current;
    f64::from(wins) / (recent.len() + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// Newest-first history whose cumulative win totals are `totals`
    fn history(totals: &[i32]) -> Vec<PlayerStats> {
        let now = Utc::now();
        totals
            .iter()
            .enumerate()
            .map(|(i, &total_wins)| PlayerStats {
                id: (totals.len() - i) as i64,
                player_id: "p".to_string(),
                timestamp: now - Duration::minutes(i as i64),
                total_wins,
                game_count: (totals.len() - i) as i32,
                winrate: 0.0,
                rolling_winrate: 0.0,
                game_duration: 0,
                streak: 0,
                elo: 1000,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    #[test]
    fn lifetime_winrate() {
        assert_eq!(winrate(0, 0), 0.0);
        assert_eq!(winrate(3, 4), 0.75);
        assert_eq!(winrate(5, 5), 1.0);
    }

    #[test]
    fn first_game_win_is_full_rate() {
        assert_eq!(rolling_winrate(&[], true), 1.0);
        assert_eq!(rolling_winrate(&[], false), 0.0);
    }

    #[test]
    fn partial_window_uses_lifetime_total() {
        // three prior games with two wins, then a loss
        let recent = history(&[2, 1, 1]);
        assert_eq!(rolling_winrate(&recent, false), 0.5);
        assert_eq!(rolling_winrate(&recent, true), 0.75);
    }

    #[test]
    fn full_window_uses_growth_across_window() {
        // ten prior snapshots, totals growing from 4 to 9
        let recent = history(&[9, 9, 8, 7, 7, 6, 5, 5, 4, 4]);
        // 9 - 4 + 1 = 6 wins out of 10
        assert_eq!(rolling_winrate(&recent, true), 0.6);
        assert_eq!(rolling_winrate(&recent, false), 0.5);
    }
}
