pub mod game_builders;
pub mod mocks;
pub mod setup;
pub mod waiting;

// Re-export main utilities for use by test files
pub use game_builders::GameBuilder;
#[allow(unused_imports)]
pub use mocks::{FailingOpponentRepository, FailingStatsRepository, SlowReadStatsRepository};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
#[allow(unused_imports)]
pub use waiting::eventually;
