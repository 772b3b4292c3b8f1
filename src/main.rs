use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mtg_tracker::{
    auth::IdentityConfig,
    core::{CoreService, InMemoryCoreService, PostgresCoreService},
    opponents::{
        InMemoryOpponentRepository, OpponentEventSubscriber, OpponentRepository,
        PostgresOpponentRepository,
    },
    stats::{
        InMemoryStatsRepository, PostgresStatsRepository, StatsEventSubscriber, StatsRepository,
        StatsService,
    },
    AppState, EventBus, Settings,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mtg_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    info!(
        bind_address = %settings.bind_address,
        handler_timeout_secs = settings.event_handler_timeout.as_secs(),
        persistent = settings.database_url.is_some(),
        verifies_tokens = settings.jwt_secret.is_some(),
        "Starting statistics service"
    );

    let event_bus = EventBus::with_handler_timeout(settings.event_handler_timeout);

    let (stats_repository, opponent_repository, core_service): (
        Arc<dyn StatsRepository>,
        Arc<dyn OpponentRepository>,
        Arc<dyn CoreService>,
    ) = match &settings.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.database_max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            let stats_repository = PostgresStatsRepository::new(pool.clone());
            stats_repository
                .ensure_schema()
                .await
                .expect("Failed to prepare player_stats table");
            let opponent_repository = PostgresOpponentRepository::new(pool.clone());
            opponent_repository
                .ensure_schema()
                .await
                .expect("Failed to prepare opponents table");

            info!("Using PostgreSQL storage");
            (
                Arc::new(stats_repository) as Arc<dyn StatsRepository>,
                Arc::new(opponent_repository) as Arc<dyn OpponentRepository>,
                Arc::new(PostgresCoreService::new(pool)) as Arc<dyn CoreService>,
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            (
                Arc::new(InMemoryStatsRepository::new()) as Arc<dyn StatsRepository>,
                Arc::new(InMemoryOpponentRepository::new()) as Arc<dyn OpponentRepository>,
                Arc::new(InMemoryCoreService::new(event_bus.clone())) as Arc<dyn CoreService>,
            )
        }
    };

    let stats_service =
        Arc::new(StatsService::builder(stats_repository, core_service.clone()).build());

    Arc::new(StatsEventSubscriber::new(stats_service.clone()))
        .register(&event_bus)
        .await;
    Arc::new(OpponentEventSubscriber::new(
        opponent_repository.clone(),
        core_service,
    ))
    .register(&event_bus)
    .await;

    let app_state = AppState::new(
        stats_service,
        opponent_repository,
        IdentityConfig::new(settings.jwt_secret.clone()),
    );
    let app = mtg_tracker::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .expect("Failed to bind listen address");
    info!("Server running on http://{}", settings.bind_address);
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
