// Per-player rating and statistics history derived from finished games

pub mod calculators;
pub mod handlers;
pub mod service;

mod errors;
pub mod models;
pub mod repository;

pub use errors::StatsError;
pub use models::*;
pub use repository::{InMemoryStatsRepository, PostgresStatsRepository, StatsRepository};
pub use service::{StatsEventSubscriber, StatsService, StatsServiceBuilder};
