pub const STARTING_ELO: i32 = 1000;
pub const K_FACTOR: f64 = 32.0;

/// An opponent's pre-game rating and finishing position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentResult {
    pub elo: i32,
    pub position: i32,
}

/// Probability that a player rated `elo` finishes ahead of one rated `opponent_elo`
pub fn expected_score(elo: i32, opponent_elo: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent_elo - elo) / 400.0))
}

/// Simultaneous multiplayer Elo update
///
/// `R' = R + K / (N - 1) * Σ (S_ij - E_ij)` over every registered opponent,
/// where `N` counts every ranking in the game, guests included. The change is
/// truncated toward zero and the result never drops below zero.
pub fn multiplayer_elo(
    elo: i32,
    position: i32,
    opponents: &[OpponentResult],
    participant_count: usize,
) -> i32 {
    if participant_count <= 1 {
        return elo;
    }

    let total: f64 = opponents
        .iter()
        .map(|opponent| {
            let actual = if position < opponent.position { 1.0 } else { 0.0 };
            actual - expected_score(elo, opponent.elo)
        })
        .sum();

    let change = K_FACTOR * total / (participant_count - 1) as f64;
    (elo + change as i32).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn even_field(positions: &[i32]) -> Vec<OpponentResult> {
        positions
            .iter()
            .map(|&position| OpponentResult {
                elo: STARTING_ELO,
                position,
            })
            .collect()
    }

    #[test]
    fn equal_ratings_expect_even_odds() {
        assert_eq!(expected_score(1000, 1000), 0.5);
        assert!(expected_score(1400, 1000) > 0.9);
        assert!(expected_score(1000, 1400) < 0.1);
    }

    #[rstest]
    #[case(1, &[2], 2, 1016)]
    #[case(2, &[1], 2, 984)]
    #[case(1, &[2, 3, 4], 4, 1016)]
    #[case(4, &[1, 2, 3], 4, 984)]
    #[case(2, &[1, 3, 4], 4, 1005)]
    #[case(3, &[1, 2, 4], 4, 995)]
    fn equal_field_outcomes(
        #[case] position: i32,
        #[case] opponent_positions: &[i32],
        #[case] participants: usize,
        #[case] expected: i32,
    ) {
        let opponents = even_field(opponent_positions);
        assert_eq!(
            multiplayer_elo(STARTING_ELO, position, &opponents, participants),
            expected
        );
    }

    #[test]
    fn guests_count_towards_field_size_only() {
        // Winner against one registered opponent in a three-seat game:
        // 32 * 0.5 / 2 = 8
        let opponents = even_field(&[3]);
        assert_eq!(multiplayer_elo(STARTING_ELO, 1, &opponents, 3), 1008);
    }

    #[test]
    fn solo_game_leaves_rating_unchanged() {
        assert_eq!(multiplayer_elo(1234, 1, &[], 1), 1234);
        assert_eq!(multiplayer_elo(1234, 1, &[], 0), 1234);
    }

    #[test]
    fn rating_never_goes_negative() {
        let opponents = [OpponentResult {
            elo: 5,
            position: 1,
        }];
        assert_eq!(multiplayer_elo(5, 2, &opponents, 2), 0);
    }

    #[test]
    fn upset_moves_more_than_expected_win() {
        let favourite = OpponentResult {
            elo: 1400,
            position: 2,
        };
        let underdog_gain = multiplayer_elo(1000, 1, &[favourite], 2) - 1000;

        let underdog = OpponentResult {
            elo: 1000,
            position: 2,
        };
        let favourite_gain = multiplayer_elo(1400, 1, &[underdog], 2) - 1400;

        assert!(underdog_gain > favourite_gain);
        assert_eq!(underdog_gain, 29);
        assert_eq!(favourite_gain, 2);
    }
}
