// "Games played together" counters between pairs of players

mod errors;
pub mod event_subscriber;
pub mod handlers;
pub mod models;
pub mod repository;

pub use errors::OpponentError;
pub use event_subscriber::OpponentEventSubscriber;
pub use models::{unique_pairs, CanonicalPair, Opponent, OpponentCount};
pub use repository::{InMemoryOpponentRepository, OpponentRepository, PostgresOpponentRepository};
