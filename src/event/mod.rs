// Event-driven architecture components
//
// Game lifecycle operations publish domain events on the bus; statistics and
// opponent bookkeeping subscribe to them without the producers knowing.

// Public API - what other modules can use
pub use bus::{EventBus, DEFAULT_HANDLER_TIMEOUT};
pub use events::{DomainEvent, EventKind};
pub use handler::{EventError, EventHandler};

// Internal modules
mod bus;
mod events;
mod handler;
