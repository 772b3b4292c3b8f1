use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    models::{CanonicalPair, Opponent, OpponentCount},
    OpponentError,
};

/// Symmetric pair counters. Every method accepts the two ids in either order.
#[async_trait]
pub trait OpponentRepository: Send + Sync {
    /// Adds one shared game, creating the pair with a count of 1 when new.
    /// Does nothing for a self pair.
    async fn increment(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError>;

    /// Removes one shared game. The count never drops below zero and the row
    /// is kept. Does nothing for a self pair or an unknown pair.
    async fn decrement(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError>;

    /// The other player of every pair involving `player_id`, most shared
    /// games first, together with the total number of pairs
    async fn opponents_of(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OpponentCount>, i64), OpponentError>;

    async fn pair(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<Option<Opponent>, OpponentError>;
}

/// In-memory implementation of opponent repository
pub struct InMemoryOpponentRepository {
    pairs: RwLock<HashMap<CanonicalPair, Opponent>>,
    next_id: AtomicI64,
}

impl InMemoryOpponentRepository {
    pub fn new() -> Self {
        Self {
            pairs: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryOpponentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpponentRepository for InMemoryOpponentRepository {
    #[instrument(skip(self))]
    async fn increment(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        let Some(key) = CanonicalPair::new(player1_id, player2_id) else {
            return Ok(());
        };

        let mut pairs = self.pairs.write().await;
        let now = Utc::now();
        pairs
            .entry(key.clone())
            .and_modify(|row| {
                row.game_count += 1;
                row.updated_at = now;
            })
            .or_insert_with(|| Opponent {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                player1_id: key.first().to_string(),
                player2_id: key.second().to_string(),
                game_count: 1,
                created_at: now,
                updated_at: now,
            });

        debug!("Opponent pair incremented in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn decrement(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        let Some(key) = CanonicalPair::new(player1_id, player2_id) else {
            return Ok(());
        };

        let mut pairs = self.pairs.write().await;
        if let Some(row) = pairs.get_mut(&key) {
            row.game_count = (row.game_count - 1).max(0);
            row.updated_at = Utc::now();
            debug!(game_count = row.game_count, "Opponent pair decremented in memory");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn opponents_of(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OpponentCount>, i64), OpponentError> {
        let pairs = self.pairs.read().await;
        let mut counts: Vec<OpponentCount> = pairs
            .iter()
            .filter_map(|(key, row)| {
                key.other(player_id).map(|other| OpponentCount {
                    player_id: other.to_string(),
                    game_count: row.game_count,
                })
            })
            .collect();
        counts.sort_by(|a, b| {
            b.game_count
                .cmp(&a.game_count)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        let total = counts.len() as i64;
        let items = counts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    async fn pair(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<Option<Opponent>, OpponentError> {
        let key = CanonicalPair::new(player1_id, player2_id).ok_or(OpponentError::SelfPair)?;
        Ok(self.pairs.read().await.get(&key).cloned())
    }
}

const OPPONENT_COLUMNS: &str = "id, player1_id, player2_id, game_count, created_at, updated_at";

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS opponents (
        id BIGSERIAL PRIMARY KEY,
        player1_id TEXT NOT NULL,
        player2_id TEXT NOT NULL,
        game_count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (player1_id, player2_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_opponents_player1 ON opponents (player1_id)",
    "CREATE INDEX IF NOT EXISTS idx_opponents_player2 ON opponents (player2_id)",
];

/// PostgreSQL implementation of opponent repository
pub struct PostgresOpponentRepository {
    pool: PgPool,
}

impl PostgresOpponentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), OpponentError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> OpponentError {
    warn!(error = %e, "Opponent query failed");
    OpponentError::Repository(e.to_string())
}

#[async_trait]
impl OpponentRepository for PostgresOpponentRepository {
    #[instrument(skip(self))]
    async fn increment(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        let Some(key) = CanonicalPair::new(player1_id, player2_id) else {
            return Ok(());
        };

        sqlx::query(
            "INSERT INTO opponents (player1_id, player2_id, game_count) VALUES ($1, $2, 1) \
             ON CONFLICT (player1_id, player2_id) \
             DO UPDATE SET game_count = opponents.game_count + 1, updated_at = NOW()",
        )
        .bind(key.first())
        .bind(key.second())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!("Opponent pair incremented in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn decrement(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        let Some(key) = CanonicalPair::new(player1_id, player2_id) else {
            return Ok(());
        };

        let result = sqlx::query(
            "UPDATE opponents SET game_count = GREATEST(game_count - 1, 0), updated_at = NOW() \
             WHERE player1_id = $1 AND player2_id = $2",
        )
        .bind(key.first())
        .bind(key.second())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(
            rows_affected = result.rows_affected(),
            "Opponent pair decremented in database"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn opponents_of(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OpponentCount>, i64), OpponentError> {
        let items = sqlx::query_as::<_, OpponentCount>(
            "SELECT CASE WHEN player1_id = $1 THEN player2_id ELSE player1_id END AS player_id, \
             game_count FROM opponents WHERE player1_id = $1 OR player2_id = $1 \
             ORDER BY game_count DESC, player_id ASC LIMIT $2 OFFSET $3",
        )
        .bind(player_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM opponents WHERE player1_id = $1 OR player2_id = $1",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    async fn pair(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<Option<Opponent>, OpponentError> {
        let key = CanonicalPair::new(player1_id, player2_id).ok_or(OpponentError::SelfPair)?;

        let sql = format!(
            "SELECT {OPPONENT_COLUMNS} FROM opponents WHERE player1_id = $1 AND player2_id = $2"
        );
        sqlx::query_as::<_, Opponent>(&sql)
            .bind(key.first())
            .bind(key.second())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }
}
