use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored "games played together" counter for one pair of players
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Opponent {
    pub id: i64,
    pub player1_id: String,
    pub player2_id: String,
    pub game_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Two distinct player ids with the lexicographically smaller one first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPair {
    first: String,
    second: String,
}

impl CanonicalPair {
    /// Returns `None` when both ids are the same player
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a.to_string(),
                second: b.to_string(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b.to_string(),
                second: a.to_string(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// The member of the pair that is not `player_id`
    pub fn other(&self, player_id: &str) -> Option<&str> {
        if self.first == player_id {
            Some(&self.second)
        } else if self.second == player_id {
            Some(&self.first)
        } else {
            None
        }
    }
}

/// Every unique pair among the given players, duplicates and self pairs dropped
pub fn unique_pairs<S: AsRef<str>>(player_ids: &[S]) -> Vec<CanonicalPair> {
    let mut ids: Vec<&str> = player_ids.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut pairs = Vec::new();
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            if let Some(pair) = CanonicalPair::new(a, b) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

/// One entry of a player's opponent list
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OpponentCount {
    pub player_id: String,
    pub game_count: i32,
}
