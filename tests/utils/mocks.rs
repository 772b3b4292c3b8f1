use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

use mtg_tracker::{
    opponents::{
        InMemoryOpponentRepository, Opponent, OpponentCount, OpponentError, OpponentRepository,
    },
    stats::{InMemoryStatsRepository, NewPlayerStats, PlayerStats, StatsError, StatsRepository},
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory stats store that fails selected operations for selected players
#[allow(dead_code)]
pub struct FailingStatsRepository {
    inner: InMemoryStatsRepository,
    failing_creates: HashSet<String>,
    failing_reads: HashSet<String>,
}

#[allow(dead_code)]
impl FailingStatsRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStatsRepository::new(),
            failing_creates: HashSet::new(),
            failing_reads: HashSet::new(),
        }
    }

    /// Appending a snapshot for this player fails
    pub fn failing_create_for(mut self, player_id: &str) -> Self {
        self.failing_creates.insert(player_id.to_string());
        self
    }

    /// Reading this player's latest snapshot fails
    pub fn failing_read_for(mut self, player_id: &str) -> Self {
        self.failing_reads.insert(player_id.to_string());
        self
    }
}

#[async_trait]
impl StatsRepository for FailingStatsRepository {
    async fn create(&self, stats: NewPlayerStats) -> Result<PlayerStats, StatsError> {
        if self.failing_creates.contains(&stats.player_id) {
            return Err(StatsError::Repository("insert rejected".to_string()));
        }
        self.inner.create(stats).await
    }

    async fn latest_for_player(&self, player_id: &str) -> Result<Option<PlayerStats>, StatsError> {
        if self.failing_reads.contains(player_id) {
            return Err(StatsError::Repository("connection reset".to_string()));
        }
        self.inner.latest_for_player(player_id).await
    }

    async fn time_series_for_player(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        self.inner
            .time_series_for_player(player_id, limit, offset)
            .await
    }

    async fn latest_for_all_players(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        self.inner.latest_for_all_players(limit, offset).await
    }

    async fn delete_all_for_player(&self, player_id: &str) -> Result<u64, StatsError> {
        self.inner.delete_all_for_player(player_id).await
    }
}

/// In-memory stats store that holds on to every "latest" read for a while
/// before handing it back, so concurrent games see the same stale snapshot
/// unless something serializes them
#[allow(dead_code)]
pub struct SlowReadStatsRepository {
    inner: InMemoryStatsRepository,
    delay: Duration,
}

#[allow(dead_code)]
impl SlowReadStatsRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStatsRepository::new(),
            delay,
        }
    }
}

#[async_trait]
impl StatsRepository for SlowReadStatsRepository {
    async fn create(&self, stats: NewPlayerStats) -> Result<PlayerStats, StatsError> {
        self.inner.create(stats).await
    }

    async fn latest_for_player(&self, player_id: &str) -> Result<Option<PlayerStats>, StatsError> {
        let latest = self.inner.latest_for_player(player_id).await;
        tokio::time::sleep(self.delay).await;
        latest
    }

    async fn time_series_for_player(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        self.inner
            .time_series_for_player(player_id, limit, offset)
            .await
    }

    async fn latest_for_all_players(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlayerStats>, i64), StatsError> {
        self.inner.latest_for_all_players(limit, offset).await
    }

    async fn delete_all_for_player(&self, player_id: &str) -> Result<u64, StatsError> {
        self.inner.delete_all_for_player(player_id).await
    }
}

/// In-memory opponent store whose increments fail for pairs touching one player
#[allow(dead_code)]
pub struct FailingOpponentRepository {
    inner: InMemoryOpponentRepository,
    failing_player: String,
}

#[allow(dead_code)]
impl FailingOpponentRepository {
    pub fn failing_for(player_id: &str) -> Self {
        Self {
            inner: InMemoryOpponentRepository::new(),
            failing_player: player_id.to_string(),
        }
    }

    fn touches(&self, a: &str, b: &str) -> bool {
        a == self.failing_player || b == self.failing_player
    }
}

#[async_trait]
impl OpponentRepository for FailingOpponentRepository {
    async fn increment(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        if self.touches(player1_id, player2_id) {
            return Err(OpponentError::Repository("write rejected".to_string()));
        }
        self.inner.increment(player1_id, player2_id).await
    }

    async fn decrement(&self, player1_id: &str, player2_id: &str) -> Result<(), OpponentError> {
        self.inner.decrement(player1_id, player2_id).await
    }

    async fn opponents_of(
        &self,
        player_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OpponentCount>, i64), OpponentError> {
        self.inner.opponents_of(player_id, limit, offset).await
    }

    async fn pair(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<Option<Opponent>, OpponentError> {
        self.inner.pair(player1_id, player2_id).await
    }
}
