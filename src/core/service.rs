use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::CoreError,
    models::{Game, GameId, NewRanking, Ranking, RankingId},
};
use crate::event::{DomainEvent, EventBus};

/// Read access to recorded games
///
/// Statistics and opponent bookkeeping only ever need to load one game by id;
/// the game records themselves are owned elsewhere.
#[async_trait]
pub trait CoreService: Send + Sync {
    async fn get_game_by_id(&self, game_id: GameId) -> Result<Game, CoreError>;
}

/// In-memory game registry for development and testing
///
/// Besides serving reads, it plays the producer side of the game lifecycle
/// and publishes the matching domain event after every change.
pub struct InMemoryCoreService {
    games: RwLock<HashMap<GameId, Game>>,
    next_game_id: AtomicU64,
    next_ranking_id: AtomicU64,
    event_bus: EventBus,
}

impl InMemoryCoreService {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            next_game_id: AtomicU64::new(1),
            next_ranking_id: AtomicU64::new(1),
            event_bus,
        }
    }

    /// Stores a game as-is without publishing anything
    pub async fn insert_game(&self, game: Game) {
        self.next_game_id.fetch_max(game.id + 1, Ordering::SeqCst);
        if let Some(max_ranking) = game.rankings.iter().map(|r| r.id).max() {
            self.next_ranking_id
                .fetch_max(max_ranking + 1, Ordering::SeqCst);
        }
        self.games.write().await.insert(game.id, game);
    }

    #[instrument(skip(self, rankings))]
    pub async fn create_game(
        &self,
        creator_id: Option<String>,
        duration: Option<i32>,
        rankings: Vec<NewRanking>,
    ) -> Game {
        let game = Game {
            id: self.next_game_id.fetch_add(1, Ordering::SeqCst),
            creator_id: creator_id.clone(),
            duration,
            rankings: rankings
                .into_iter()
                .map(|r| Ranking {
                    id: self.next_ranking_id.fetch_add(1, Ordering::SeqCst),
                    player_id: r.player_id,
                    position: r.position,
                })
                .collect(),
            finished: false,
        };

        self.games.write().await.insert(game.id, game.clone());
        info!(game_id = game.id, rankings = game.rankings.len(), "Game created");

        self.event_bus
            .publish(DomainEvent::GameCreated {
                game_id: game.id,
                creator_id,
                ranking_ids: game.ranking_ids(),
                date: Utc::now(),
            })
            .await;

        game
    }

    /// Marks a game finished. Every call publishes `GameFinished`, so finishing
    /// twice replays the event.
    #[instrument(skip(self))]
    pub async fn finish_game(&self, game_id: GameId) -> Result<Game, CoreError> {
        let game = {
            let mut games = self.games.write().await;
            let game = games
                .get_mut(&game_id)
                .ok_or(CoreError::GameNotFound(game_id))?;
            game.finished = true;
            game.clone()
        };

        info!(game_id, "Game finished");
        self.event_bus
            .publish(DomainEvent::GameFinished {
                game_id,
                ranking_ids: game.ranking_ids(),
                date: Utc::now(),
            })
            .await;

        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn delete_game(&self, game_id: GameId) -> Result<(), CoreError> {
        let game = self
            .games
            .write()
            .await
            .remove(&game_id)
            .ok_or(CoreError::GameNotFound(game_id))?;

        info!(game_id, "Game deleted");
        self.event_bus
            .publish(DomainEvent::GameDeleted {
                game_id,
                ranking_ids: game.ranking_ids(),
                player_ids: game.player_ids(),
                date: Utc::now(),
            })
            .await;

        Ok(())
    }

    /// Removes one ranking from a game. Guest rankings are removed silently.
    #[instrument(skip(self))]
    pub async fn remove_ranking(
        &self,
        game_id: GameId,
        ranking_id: RankingId,
    ) -> Result<(), CoreError> {
        let (removed, other_player_ids) = {
            let mut games = self.games.write().await;
            let game = games
                .get_mut(&game_id)
                .ok_or(CoreError::GameNotFound(game_id))?;
            let index = game
                .rankings
                .iter()
                .position(|r| r.id == ranking_id)
                .ok_or(CoreError::RankingNotFound {
                    game_id,
                    ranking_id,
                })?;
            let removed = game.rankings.remove(index);
            (removed, game.player_ids())
        };

        let Some(player_id) = removed.player_id else {
            debug!(game_id, ranking_id, "Removed guest ranking");
            return Ok(());
        };

        info!(game_id, ranking_id, player_id = %player_id, "Ranking removed");
        self.event_bus
            .publish(DomainEvent::RankingDeleted {
                ranking_id,
                game_id,
                player_id,
                other_player_ids,
                date: Utc::now(),
            })
            .await;

        Ok(())
    }
}

#[async_trait]
impl CoreService for InMemoryCoreService {
    async fn get_game_by_id(&self, game_id: GameId) -> Result<Game, CoreError> {
        let games = self.games.read().await;
        games
            .get(&game_id)
            .cloned()
            .ok_or(CoreError::GameNotFound(game_id))
    }
}

/// Read-only loader over the `games` and `rankings` tables
pub struct PostgresCoreService {
    pool: PgPool,
}

impl PostgresCoreService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoreService for PostgresCoreService {
    #[instrument(skip(self))]
    async fn get_game_by_id(&self, game_id: GameId) -> Result<Game, CoreError> {
        debug!(game_id, "Fetching game from database");

        let id = i64::try_from(game_id).map_err(|_| CoreError::GameNotFound(game_id))?;

        let row = sqlx::query(
            "SELECT id, creator_id, duration, finished FROM games WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_id, "Failed to fetch game from database");
            CoreError::Repository(e.to_string())
        })?
        .ok_or(CoreError::GameNotFound(game_id))?;

        let ranking_rows = sqlx::query(
            "SELECT id, player_id, position FROM rankings WHERE game_id = $1 AND deleted_at IS NULL ORDER BY position ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, game_id, "Failed to fetch rankings from database");
            CoreError::Repository(e.to_string())
        })?;

        let rankings = ranking_rows
            .into_iter()
            .map(|r| Ranking {
                id: r.get::<i64, _>("id") as RankingId,
                player_id: r.get("player_id"),
                position: r.get::<i64, _>("position") as i32,
            })
            .collect();

        Ok(Game {
            id: game_id,
            creator_id: row.get("creator_id"),
            duration: row.get::<Option<i64>, _>("duration").map(|d| d as i32),
            rankings,
            finished: row.get("finished"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventError, EventHandler, EventKind};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct ForwardingHandler {
        sender: mpsc::UnboundedSender<DomainEvent>,
    }

    #[async_trait]
    impl EventHandler for ForwardingHandler {
        async fn handle(&self, event: &DomainEvent) -> Result<(), EventError> {
            let _ = self.sender.send(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "ForwardingHandler"
        }
    }

    async fn service_with_listener(
        kind: EventKind,
    ) -> (InMemoryCoreService, mpsc::UnboundedReceiver<DomainEvent>) {
        let bus = EventBus::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        bus.subscribe(kind, Arc::new(ForwardingHandler { sender }))
            .await;
        (InMemoryCoreService::new(bus), receiver)
    }

    async fn next_event(receiver: &mut mpsc::UnboundedReceiver<DomainEvent>) -> DomainEvent {
        tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("event should be published")
            .expect("channel open")
    }

    fn roster() -> Vec<NewRanking> {
        vec![
            NewRanking::player("alice", 1),
            NewRanking::guest(2),
            NewRanking::player("bob", 3),
        ]
    }

    #[tokio::test]
    async fn create_game_assigns_ids_and_publishes() {
        let (service, mut events) = service_with_listener(EventKind::GameCreated).await;

        let game = service
            .create_game(Some("alice".to_string()), Some(45), roster())
            .await;

        assert!(!game.finished);
        assert_eq!(game.rankings.len(), 3);
        assert_eq!(game.player_ids(), vec!["alice", "bob"]);

        match next_event(&mut events).await {
            DomainEvent::GameCreated {
                game_id,
                creator_id,
                ranking_ids,
                ..
            } => {
                assert_eq!(game_id, game.id);
                assert_eq!(creator_id.as_deref(), Some("alice"));
                assert_eq!(ranking_ids, game.ranking_ids());
            }
            other => panic!("unexpected event {other:?}"),
        }

        let stored = service.get_game_by_id(game.id).await.unwrap();
        assert_eq!(stored, game);
    }

    #[tokio::test]
    async fn finish_game_publishes_every_time() {
        let (service, mut events) = service_with_listener(EventKind::GameFinished).await;
        let game = service.create_game(None, None, roster()).await;

        service.finish_game(game.id).await.unwrap();
        service.finish_game(game.id).await.unwrap();

        assert_eq!(next_event(&mut events).await.game_id(), game.id);
        assert_eq!(next_event(&mut events).await.game_id(), game.id);
        assert!(service.get_game_by_id(game.id).await.unwrap().finished);
    }

    #[tokio::test]
    async fn delete_game_captures_roster_on_event() {
        let (service, mut events) = service_with_listener(EventKind::GameDeleted).await;
        let game = service.create_game(None, None, roster()).await;

        service.delete_game(game.id).await.unwrap();

        match next_event(&mut events).await {
            DomainEvent::GameDeleted { player_ids, .. } => {
                assert_eq!(player_ids, vec!["alice", "bob"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            service.get_game_by_id(game.id).await,
            Err(CoreError::GameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_ranking_reports_remaining_players() {
        let (service, mut events) = service_with_listener(EventKind::RankingDeleted).await;
        let game = service.create_game(None, None, roster()).await;
        let alice_ranking = game.rankings[0].id;

        service.remove_ranking(game.id, alice_ranking).await.unwrap();

        match next_event(&mut events).await {
            DomainEvent::RankingDeleted {
                player_id,
                other_player_ids,
                ..
            } => {
                assert_eq!(player_id, "alice");
                assert_eq!(other_player_ids, vec!["bob"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn removing_guest_ranking_publishes_nothing() {
        let (service, mut events) = service_with_listener(EventKind::RankingDeleted).await;
        let game = service.create_game(None, None, roster()).await;
        let guest_ranking = game.rankings[1].id;

        service.remove_ranking(game.id, guest_ranking).await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
        assert!(waited.is_err());
        assert_eq!(
            service.get_game_by_id(game.id).await.unwrap().rankings.len(),
            2
        );
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let service = InMemoryCoreService::new(EventBus::new());
        assert!(matches!(
            service.finish_game(99).await,
            Err(CoreError::GameNotFound(99))
        ));
    }
}
