// Game records as consumed by the statistics and opponent subscribers

mod errors;
pub mod models;
pub mod service;

pub use errors::CoreError;
pub use models::{Game, GameId, NewRanking, Ranking, RankingId};
pub use service::{CoreService, InMemoryCoreService, PostgresCoreService};
