use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for `oneshot`

use mtg_tracker::{
    auth::IdentityConfig,
    build_router,
    core::InMemoryCoreService,
    opponents::{InMemoryOpponentRepository, OpponentEventSubscriber, OpponentRepository},
    stats::{InMemoryStatsRepository, StatsEventSubscriber, StatsRepository, StatsService},
    AppState, EventBus,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Fully wired service: in-memory stores, core registry and both subscribers
/// registered on one bus
#[allow(dead_code)]
pub struct TestSetup {
    pub event_bus: EventBus,
    pub core: Arc<InMemoryCoreService>,
    pub stats_repository: Arc<dyn StatsRepository>,
    pub stats_service: Arc<StatsService>,
    pub opponent_repository: Arc<dyn OpponentRepository>,
    pub router: Router,
}

impl TestSetup {
    /// Sends a GET through the full router and returns status and JSON body
    #[allow(dead_code)]
    pub async fn get_json(
        &self,
        uri: &str,
        bearer: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }
}

pub struct TestSetupBuilder {
    stats_repository: Option<Arc<dyn StatsRepository>>,
    opponent_repository: Option<Arc<dyn OpponentRepository>>,
    serialize_player_updates: bool,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            stats_repository: None,
            opponent_repository: None,
            serialize_player_updates: true,
        }
    }

    pub fn with_stats_repository(mut self, repo: Arc<dyn StatsRepository>) -> Self {
        self.stats_repository = Some(repo);
        self
    }

    pub fn with_opponent_repository(mut self, repo: Arc<dyn OpponentRepository>) -> Self {
        self.opponent_repository = Some(repo);
        self
    }

    pub fn serialize_player_updates(mut self, enabled: bool) -> Self {
        self.serialize_player_updates = enabled;
        self
    }

    pub async fn build(self) -> TestSetup {
        let event_bus = EventBus::new();
        let core = Arc::new(InMemoryCoreService::new(event_bus.clone()));
        let stats_repository = self
            .stats_repository
            .unwrap_or_else(|| Arc::new(InMemoryStatsRepository::new()));
        let opponent_repository = self
            .opponent_repository
            .unwrap_or_else(|| Arc::new(InMemoryOpponentRepository::new()));

        let stats_service = Arc::new(
            StatsService::builder(stats_repository.clone(), core.clone())
                .serialize_player_updates(self.serialize_player_updates)
                .build(),
        );

        Arc::new(StatsEventSubscriber::new(stats_service.clone()))
            .register(&event_bus)
            .await;
        Arc::new(OpponentEventSubscriber::new(
            opponent_repository.clone(),
            core.clone(),
        ))
        .register(&event_bus)
        .await;

        let router = build_router(AppState::new(
            stats_service.clone(),
            opponent_repository.clone(),
            IdentityConfig::development(),
        ));

        TestSetup {
            event_bus,
            core,
            stats_repository,
            stats_service,
            opponent_repository,
            router,
        }
    }
}
