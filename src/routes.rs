use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::identify_caller;
use crate::opponents::handlers as opponents;
use crate::shared::AppState;
use crate::stats::handlers as stats;

/// Full read API with caller identification, tracing and permissive CORS
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/statistics/v1/players", get(stats::list_player_stats))
        .route(
            "/statistics/v1/players/:player_id",
            get(stats::get_player_stats),
        )
        .route(
            "/statistics/v1/players/:player_id/timeseries",
            get(stats::get_player_timeseries),
        )
        .route("/statistics/v1/me", get(stats::get_my_stats))
        .route("/statistics/v1/me/timeseries", get(stats::get_my_timeseries))
        .route("/opponent/v1/opponents", get(opponents::get_my_opponents))
        .route(
            "/opponent/v1/players/:player_id/opponents",
            get(opponents::get_player_opponents),
        )
        .layer(middleware::from_fn_with_state(state.clone(), identify_caller))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
