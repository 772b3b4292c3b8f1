use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, instrument};

use crate::{
    core::{CoreService, GameId},
    event::{DomainEvent, EventBus, EventError, EventHandler, EventKind},
    pagination::{PaginatedResult, Pagination},
};

use super::{
    calculators::{self, GameOutcome, OpponentResult, ROLLING_WINDOW},
    models::{NewPlayerStats, PlayerStats},
    repository::StatsRepository,
    StatsError,
};

/// Derives and stores per-player statistics for finished games
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    core_service: Arc<dyn CoreService>,
    serialize_player_updates: bool,
    player_mutexes: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl StatsService {
    pub fn builder(
        repository: Arc<dyn StatsRepository>,
        core_service: Arc<dyn CoreService>,
    ) -> StatsServiceBuilder {
        StatsServiceBuilder::new(repository, core_service)
    }

    /// Appends one snapshot per registered participant of a finished game
    ///
    /// Every participant's pre-game standing is read before anything is
    /// written, so all rating changes for the game come from the same
    /// ratings. A failure for one player is logged and the others still get
    /// their snapshot; the returned list holds only what was stored.
    #[instrument(skip(self))]
    pub async fn process_finished_game(
        &self,
        game_id: GameId,
    ) -> Result<Vec<PlayerStats>, StatsError> {
        let game = self
            .core_service
            .get_game_by_id(game_id)
            .await
            .map_err(|e| {
                error!(game_id, error = %e, "Failed to fetch finished game");
                StatsError::from(e)
            })?;

        let participants: Vec<(&str, i32)> = game
            .rankings
            .iter()
            .filter_map(|r| r.player_id.as_deref().map(|id| (id, r.position)))
            .collect();

        let _guards = if self.serialize_player_updates {
            self.lock_players(participants.iter().map(|(id, _)| *id))
                .await
        } else {
            Vec::new()
        };

        let mut standings: HashMap<&str, NewPlayerStats> = HashMap::new();
        for (player_id, _) in &participants {
            if standings.contains_key(player_id) {
                continue;
            }
            let standing = self.current_standing(player_id).await.map_err(|e| {
                error!(game_id, player_id, error = %e, "Failed to load pre-game standing");
                e
            })?;
            standings.insert(*player_id, standing);
        }

        let mut created = Vec::with_capacity(participants.len());
        for (player_id, position) in &participants {
            let opponents: Vec<OpponentResult> = participants
                .iter()
                .filter(|(other, _)| other != player_id)
                .map(|(other, other_position)| OpponentResult {
                    elo: standings[other].elo,
                    position: *other_position,
                })
                .collect();

            let outcome = GameOutcome {
                position: *position,
                duration: game.duration,
                participant_count: game.rankings.len(),
                opponents,
            };

            match self
                .record_outcome(&standings[player_id], &outcome)
                .await
            {
                Ok(stats) => {
                    info!(
                        game_id,
                        player_id,
                        elo = stats.elo,
                        winrate = stats.winrate,
                        "Updated player statistics"
                    );
                    created.push(stats);
                }
                Err(e) => {
                    error!(game_id, player_id, error = %e, "Failed to record player statistics");
                }
            }
        }

        Ok(created)
    }

    /// Newest snapshot for the player, or [`StatsError::NotFound`] without history
    pub async fn latest_for_player(&self, player_id: &str) -> Result<PlayerStats, StatsError> {
        self.repository
            .latest_for_player(player_id)
            .await?
            .ok_or_else(|| StatsError::NotFound(player_id.to_string()))
    }

    pub async fn time_series_for_player(
        &self,
        player_id: &str,
        pagination: Pagination,
    ) -> Result<PaginatedResult<PlayerStats>, StatsError> {
        let (items, total) = self
            .repository
            .time_series_for_player(player_id, pagination.limit(), pagination.offset())
            .await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// Every player's newest snapshot, highest rating first
    pub async fn leaderboard(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResult<PlayerStats>, StatsError> {
        let (items, total) = self
            .repository
            .latest_for_all_players(pagination.limit(), pagination.offset())
            .await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// Drops a player's whole history, used when an account is removed
    ///
    /// The player's lock entry stays in place: a game still in flight may hold
    /// it, and later games must queue behind that same lock.
    pub async fn delete_player_stats(&self, player_id: &str) -> Result<u64, StatsError> {
        let removed = self.repository.delete_all_for_player(player_id).await?;
        info!(player_id, removed, "Deleted player statistics");
        Ok(removed)
    }

    async fn current_standing(&self, player_id: &str) -> Result<NewPlayerStats, StatsError> {
        Ok(self
            .repository
            .latest_for_player(player_id)
            .await?
            .map(NewPlayerStats::from)
            .unwrap_or_else(|| {
                debug!(player_id, "No statistics yet, starting from baseline");
                NewPlayerStats::baseline(player_id)
            }))
    }

    async fn record_outcome(
        &self,
        current: &NewPlayerStats,
        outcome: &GameOutcome,
    ) -> Result<PlayerStats, StatsError> {
        let (recent, _) = self
            .repository
            .time_series_for_player(&current.player_id, ROLLING_WINDOW as i64, 0)
            .await?;

        let next = calculators::next_snapshot(current, outcome, &recent);
        self.repository.create(next).await
    }

    /// Locks every listed player in a fixed order so that two games sharing
    /// players cannot deadlock
    async fn lock_players<'a>(
        &self,
        player_ids: impl Iterator<Item = &'a str>,
    ) -> Vec<OwnedMutexGuard<()>> {
        let ordered: BTreeSet<&str> = player_ids.collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for player_id in ordered {
            guards.push(self.player_lock(player_id).await.lock_owned().await);
        }
        guards
    }

    async fn player_lock(&self, player_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.player_mutexes.read().await;
            if let Some(lock) = guard.get(player_id) {
                return lock.clone();
            }
        }

        let mut guard = self.player_mutexes.write().await;
        guard
            .entry(player_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

pub struct StatsServiceBuilder {
    repository: Arc<dyn StatsRepository>,
    core_service: Arc<dyn CoreService>,
    serialize_player_updates: bool,
}

impl StatsServiceBuilder {
    fn new(repository: Arc<dyn StatsRepository>, core_service: Arc<dyn CoreService>) -> Self {
        Self {
            repository,
            core_service,
            serialize_player_updates: true,
        }
    }

    /// When disabled, concurrent games sharing a player may both build on the
    /// same stale snapshot and one update is lost
    pub fn serialize_player_updates(mut self, enabled: bool) -> Self {
        self.serialize_player_updates = enabled;
        self
    }

    pub fn build(self) -> StatsService {
        StatsService {
            repository: self.repository,
            core_service: self.core_service,
            serialize_player_updates: self.serialize_player_updates,
            player_mutexes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Bus subscriber that feeds `game.finished` events into the [`StatsService`]
pub struct StatsEventSubscriber {
    stats_service: Arc<StatsService>,
}

impl StatsEventSubscriber {
    pub fn new(stats_service: Arc<StatsService>) -> Self {
        Self { stats_service }
    }

    pub async fn register(self: Arc<Self>, event_bus: &EventBus) {
        event_bus.subscribe(EventKind::GameFinished, self).await;
        info!("Statistics event handlers registered");
    }
}

#[async_trait]
impl EventHandler for StatsEventSubscriber {
    async fn handle(&self, event: &DomainEvent) -> Result<(), EventError> {
        match event {
            DomainEvent::GameFinished { game_id, .. } => {
                info!(game_id, "Processing game.finished for statistics");
                self.stats_service
                    .process_finished_game(*game_id)
                    .await
                    .map(|_| ())
                    .map_err(EventError::from)
            }
            DomainEvent::GameCreated { .. }
            | DomainEvent::GameDeleted { .. }
            | DomainEvent::RankingDeleted { .. } => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "StatsEventSubscriber"
    }
}
