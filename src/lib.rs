// Library crate for the game statistics service
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod config;
pub mod core;
pub mod event;
pub mod opponents;
pub mod pagination;
pub mod routes;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use config::Settings;
pub use event::{DomainEvent, EventBus, EventError, EventHandler, EventKind};
pub use routes::build_router;
pub use shared::{AppError, AppState};
