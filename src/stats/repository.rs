use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    models::{NewPlayerStats, PlayerStats},
    StatsError,
};

/// Append-only storage of statistics snapshots
///
/// Paged reads return the page together with the total number of matching rows.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn create(&self, stats: NewPlayerStats) -> Result<PlayerStats, StatsError>;

    /// Newest snapshot for the player, `None` when they have no history
    async fn latest_for_player(&self, player_id: &str)
        -> Result<Option<PlayerStats>, StatsError>;

    /// Player's snapshots, newest first
    async fn time_series_for_player(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError>;

    /// Newest snapshot of every player, highest rating first
    async fn latest_for_all_players(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError>;

    /// Removes a player's whole history; returns the number of rows removed
    async fn delete_all_for_player(&self, player_id: &str) -> Result<u64, StatsError>;
}

/// In-memory implementation of StatsRepository for development and testing
#[derive(Debug)]
pub struct InMemoryStatsRepository {
    rows: RwLock<Vec<PlayerStats>>,
    next_id: AtomicI64,
}

impl Default for InMemoryStatsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Total number of stored snapshots across all players
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

/// Newest first; insertion order breaks timestamp ties
fn newest_first(a: &PlayerStats, b: &PlayerStats) -> std::cmp::Ordering {
    b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id))
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    #[instrument(skip(self, stats), fields(player_id = %stats.player_id))]
    async fn create(&self, stats: NewPlayerStats) -> Result<PlayerStats, StatsError> {
        let now = Utc::now();
        let row = PlayerStats {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            player_id: stats.player_id,
            timestamp: stats.timestamp.unwrap_or(now),
            total_wins: stats.total_wins,
            game_count: stats.game_count,
            winrate: stats.winrate,
            rolling_winrate: stats.rolling_winrate,
            game_duration: stats.game_duration,
            streak: stats.streak,
            elo: stats.elo,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.push(row.clone());
        debug!(stats_id = row.id, "Stats snapshot stored in memory");
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn latest_for_player(
        &self,
        player_id: &str,
    ) -> Result<Option<PlayerStats>, StatsError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|s| s.player_id == player_id)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn time_series_for_player(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        let rows = self.rows.read().await;
        let mut series: Vec<PlayerStats> = rows
            .iter()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect();
        series.sort_by(newest_first);

        let total = series.len() as i64;
        Ok((page(&series, limit, offset), total))
    }

    #[instrument(skip(self))]
    async fn latest_for_all_players(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        let rows = self.rows.read().await;
        let mut latest: HashMap<&str, &PlayerStats> = HashMap::new();
        for row in rows.iter() {
            latest
                .entry(row.player_id.as_str())
                .and_modify(|current| {
                    if newest_first(row, *current).is_lt() {
                        *current = row;
                    }
                })
                .or_insert(row);
        }

        let mut leaderboard: Vec<PlayerStats> = latest.into_values().cloned().collect();
        leaderboard.sort_by(|a, b| b.elo.cmp(&a.elo).then_with(|| a.player_id.cmp(&b.player_id)));

        let total = leaderboard.len() as i64;
        Ok((page(&leaderboard, limit, offset), total))
    }

    #[instrument(skip(self))]
    async fn delete_all_for_player(&self, player_id: &str) -> Result<u64, StatsError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|s| s.player_id != player_id);
        let removed = (before - rows.len()) as u64;
        debug!(removed, "Player stats deleted from memory");
        Ok(removed)
    }
}

const STATS_COLUMNS: &str = "id, player_id, timestamp, total_wins, game_count, winrate, \
     rolling_winrate, game_duration, streak, elo, created_at, updated_at";

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS player_stats (
        id BIGSERIAL PRIMARY KEY,
        player_id TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        total_wins INTEGER NOT NULL DEFAULT 0,
        game_count INTEGER NOT NULL DEFAULT 0,
        winrate DOUBLE PRECISION NOT NULL DEFAULT 0,
        rolling_winrate DOUBLE PRECISION NOT NULL DEFAULT 0,
        game_duration INTEGER NOT NULL DEFAULT 0,
        streak INTEGER NOT NULL DEFAULT 0,
        elo INTEGER NOT NULL DEFAULT 1000,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        deleted_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS idx_player_stats_player_timestamp
        ON player_stats (player_id, timestamp DESC)",
];

/// PostgreSQL implementation of stats repository
///
/// Deleting a player's history soft-deletes the rows; every read ignores them.
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `player_stats` table and its index if they are missing
    pub async fn ensure_schema(&self) -> Result<(), StatsError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> StatsError {
    warn!(error = %e, "Stats query failed");
    StatsError::Repository(e.to_string())
}

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    #[instrument(skip(self, stats), fields(player_id = %stats.player_id))]
    async fn create(&self, stats: NewPlayerStats) -> Result<PlayerStats, StatsError> {
        let timestamp = stats.timestamp.unwrap_or_else(Utc::now);
        let sql = format!(
            "INSERT INTO player_stats (player_id, timestamp, total_wins, game_count, winrate, \
             rolling_winrate, game_duration, streak, elo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {STATS_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PlayerStats>(&sql)
            .bind(&stats.player_id)
            .bind(timestamp)
            .bind(stats.total_wins)
            .bind(stats.game_count)
            .bind(stats.winrate)
            .bind(stats.rolling_winrate)
            .bind(stats.game_duration)
            .bind(stats.streak)
            .bind(stats.elo)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        debug!(stats_id = row.id, "Stats snapshot stored in database");
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn latest_for_player(
        &self,
        player_id: &str,
    ) -> Result<Option<PlayerStats>, StatsError> {
        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM player_stats \
             WHERE player_id = $1 AND deleted_at IS NULL \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );

        sqlx::query_as::<_, PlayerStats>(&sql)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    #[instrument(skip(self))]
    async fn time_series_for_player(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM player_stats WHERE player_id = $1 AND deleted_at IS NULL",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM player_stats \
             WHERE player_id = $1 AND deleted_at IS NULL \
             ORDER BY timestamp DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PlayerStats>(&sql)
            .bind(player_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    async fn latest_for_all_players(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT player_id) FROM player_stats WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM ( \
                SELECT DISTINCT ON (player_id) {STATS_COLUMNS} FROM player_stats \
                WHERE deleted_at IS NULL \
                ORDER BY player_id, timestamp DESC, id DESC \
             ) latest \
             ORDER BY elo DESC, player_id ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, PlayerStats>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    async fn delete_all_for_player(&self, player_id: &str) -> Result<u64, StatsError> {
        let result = sqlx::query(
            "UPDATE player_stats SET deleted_at = NOW(), updated_at = NOW() \
             WHERE player_id = $1 AND deleted_at IS NULL",
        )
        .bind(player_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
