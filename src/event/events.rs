use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{GameId, RankingId};

/// Key under which handlers subscribe on the [`EventBus`](super::EventBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    GameCreated,
    GameFinished,
    GameDeleted,
    RankingDeleted,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::GameCreated => "game.created",
            EventKind::GameFinished => "game.finished",
            EventKind::GameDeleted => "game.deleted",
            EventKind::RankingDeleted => "ranking.deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events published by the game lifecycle
///
/// Events represent facts about things that have already happened.
/// Producers publish them on the bus without knowing who consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new game has been recorded
    GameCreated {
        game_id: GameId,
        creator_id: Option<String>,
        ranking_ids: Vec<RankingId>,
        date: DateTime<Utc>,
    },

    /// A game has been marked as finished
    GameFinished {
        game_id: GameId,
        ranking_ids: Vec<RankingId>,
        date: DateTime<Utc>,
    },

    /// A game has been deleted. The roster is captured on the event
    /// because the game record no longer exists when handlers run.
    GameDeleted {
        game_id: GameId,
        ranking_ids: Vec<RankingId>,
        player_ids: Vec<String>,
        date: DateTime<Utc>,
    },

    /// A player removed themselves from a game
    RankingDeleted {
        ranking_id: RankingId,
        game_id: GameId,
        player_id: String,
        other_player_ids: Vec<String>,
        date: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::GameCreated { .. } => EventKind::GameCreated,
            DomainEvent::GameFinished { .. } => EventKind::GameFinished,
            DomainEvent::GameDeleted { .. } => EventKind::GameDeleted,
            DomainEvent::RankingDeleted { .. } => EventKind::RankingDeleted,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The game this event is about
    pub fn game_id(&self) -> GameId {
        match self {
            DomainEvent::GameCreated { game_id, .. } => *game_id,
            DomainEvent::GameFinished { game_id, .. } => *game_id,
            DomainEvent::GameDeleted { game_id, .. } => *game_id,
            DomainEvent::RankingDeleted { game_id, .. } => *game_id,
        }
    }
}
