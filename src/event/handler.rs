use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::events::DomainEvent;

/// Errors that can occur when handling events
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EventError {
    #[error("Handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handler panicked: {0}")]
    Panic(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Handler error: {0}")]
    Handler(String),
}

impl EventError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        EventError::Upstream(msg.into())
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        EventError::Handler(msg.into())
    }
}

/// Trait for components that react to domain events
///
/// A handler is registered on the bus under one or more [`EventKind`](super::EventKind)s
/// and is only invoked with events of those kinds.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle a domain event
    ///
    /// Returning an error never reaches the publisher: the bus logs it
    /// (async publish) or hands it back from `publish_sync`.
    async fn handle(&self, event: &DomainEvent) -> Result<(), EventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}
