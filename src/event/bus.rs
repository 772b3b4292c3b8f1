use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::{
    events::{DomainEvent, EventKind},
    handler::{EventError, EventHandler},
};

pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide publish/subscribe router for domain events
///
/// Cloning the bus is cheap and every clone shares the same registry, so a
/// single instance built at startup is handed to every producer and consumer.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>>,
    handler_timeout: Duration,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_handler_timeout(DEFAULT_HANDLER_TIMEOUT)
    }

    /// Creates a bus that abandons any single handler invocation after `handler_timeout`
    pub fn with_handler_timeout(handler_timeout: Duration) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            handler_timeout,
        }
    }

    /// Registers a handler for an event kind. Handlers are not deduplicated.
    pub async fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        info!(event = %kind, handler = handler.name(), "Subscribed handler");
        handlers.entry(kind).or_default().push(handler);
    }

    /// Removes every handler registered for an event kind
    pub async fn unsubscribe(&self, kind: EventKind) {
        let mut handlers = self.handlers.write().await;
        handlers.remove(&kind);
        info!(event = %kind, "Unsubscribed all handlers");
    }

    pub async fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).map(Vec::len).unwrap_or_default()
    }

    /// Fans the event out to every handler for its kind, one spawned task per
    /// handler. Returns without waiting for any handler to start or finish.
    pub async fn publish(&self, event: DomainEvent) {
        let handlers = self.handlers_for(event.kind()).await;
        if handlers.is_empty() {
            debug!(event = event.name(), "No handlers registered for event");
            return;
        }

        let event = Arc::new(event);
        for handler in handlers {
            let event = Arc::clone(&event);
            let handler_timeout = self.handler_timeout;

            tokio::spawn(async move {
                if let Err(e) = invoke(&handler, &event, handler_timeout).await {
                    error!(
                        event = event.name(),
                        game_id = event.game_id(),
                        handler = handler.name(),
                        error = %e,
                        "Event handler failed"
                    );
                }
            });
        }
    }

    /// Runs every handler for the event's kind in registration order on the
    /// caller's task. All handlers run; the first error is returned.
    pub async fn publish_sync(&self, event: DomainEvent) -> Result<(), EventError> {
        let handlers = self.handlers_for(event.kind()).await;
        if handlers.is_empty() {
            debug!(event = event.name(), "No handlers registered for event");
            return Ok(());
        }

        let mut first_error = None;
        for handler in handlers {
            if let Err(e) = invoke(&handler, &event, self.handler_timeout).await {
                error!(
                    event = event.name(),
                    game_id = event.game_id(),
                    handler = handler.name(),
                    error = %e,
                    "Event handler failed"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Snapshot of the handler list; the read lock is released before any handler runs
    async fn handlers_for(&self, kind: EventKind) -> Vec<Arc<dyn EventHandler>> {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).cloned().unwrap_or_default()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

async fn invoke(
    handler: &Arc<dyn EventHandler>,
    event: &DomainEvent,
    handler_timeout: Duration,
) -> Result<(), EventError> {
    let guarded = AssertUnwindSafe(handler.handle(event)).catch_unwind();
    match timeout(handler_timeout, guarded).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(EventError::Panic(panic_message(payload.as_ref()))),
        Err(_elapsed) => Err(EventError::Timeout(handler_timeout)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
