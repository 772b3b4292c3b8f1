use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::core::{CoreService, GameId};
use crate::event::{DomainEvent, EventBus, EventError, EventHandler, EventKind};

use super::{
    models::{unique_pairs, CanonicalPair},
    repository::OpponentRepository,
    OpponentError,
};

/// Keeps pair counters in step with game creation and removal
pub struct OpponentEventSubscriber {
    repository: Arc<dyn OpponentRepository>,
    core_service: Arc<dyn CoreService>,
}

impl OpponentEventSubscriber {
    pub fn new(
        repository: Arc<dyn OpponentRepository>,
        core_service: Arc<dyn CoreService>,
    ) -> Self {
        Self {
            repository,
            core_service,
        }
    }

    pub async fn register(self: Arc<Self>, event_bus: &EventBus) {
        event_bus
            .subscribe(EventKind::GameCreated, self.clone())
            .await;
        event_bus
            .subscribe(EventKind::GameDeleted, self.clone())
            .await;
        event_bus.subscribe(EventKind::RankingDeleted, self).await;
        info!("Opponent event handlers registered");
    }

    #[instrument(skip(self))]
    async fn on_game_created(&self, game_id: GameId) -> Result<(), OpponentError> {
        let game = self.core_service.get_game_by_id(game_id).await?;
        let pairs = unique_pairs(&game.player_ids());

        let failed = self.apply(&pairs, Direction::Increment).await;
        info!(game_id, pairs = pairs.len(), failed, "Opponent counts incremented");
        Ok(())
    }

    #[instrument(skip(self, player_ids))]
    async fn on_game_deleted(&self, game_id: GameId, player_ids: &[String]) {
        let pairs = unique_pairs(player_ids);

        let failed = self.apply(&pairs, Direction::Decrement).await;
        info!(game_id, pairs = pairs.len(), failed, "Opponent counts decremented");
    }

    #[instrument(skip(self, other_player_ids))]
    async fn on_ranking_deleted(&self, player_id: &str, other_player_ids: &[String]) {
        let mut others: Vec<&str> = other_player_ids.iter().map(String::as_str).collect();
        others.sort_unstable();
        others.dedup();

        let pairs: Vec<CanonicalPair> = others
            .into_iter()
            .filter_map(|other| CanonicalPair::new(player_id, other))
            .collect();

        let failed = self.apply(&pairs, Direction::Decrement).await;
        info!(player_id, pairs = pairs.len(), failed, "Opponent counts decremented for removed player");
    }

    /// Applies the change to every pair and returns how many failed
    async fn apply(&self, pairs: &[CanonicalPair], direction: Direction) -> usize {
        let mut failed = 0;
        for pair in pairs {
            let result = match direction {
                Direction::Increment => self.repository.increment(pair.first(), pair.second()).await,
                Direction::Decrement => self.repository.decrement(pair.first(), pair.second()).await,
            };
            if let Err(e) = result {
                failed += 1;
                error!(
                    player1_id = pair.first(),
                    player2_id = pair.second(),
                    error = %e,
                    "Failed to update opponent count"
                );
            }
        }
        failed
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Increment,
    Decrement,
}

#[async_trait]
impl EventHandler for OpponentEventSubscriber {
    async fn handle(&self, event: &DomainEvent) -> Result<(), EventError> {
        match event {
            DomainEvent::GameCreated { game_id, .. } => {
                self.on_game_created(*game_id).await.map_err(|e| {
                    error!(game_id, error = %e, "Failed to process game.created for opponents");
                    EventError::from(e)
                })
            }
            DomainEvent::GameDeleted {
                game_id,
                player_ids,
                ..
            } => {
                self.on_game_deleted(*game_id, player_ids).await;
                Ok(())
            }
            DomainEvent::RankingDeleted {
                player_id,
                other_player_ids,
                ..
            } => {
                self.on_ranking_deleted(player_id, other_player_ids).await;
                Ok(())
            }
            DomainEvent::GameFinished { .. } => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "OpponentEventSubscriber"
    }
}
