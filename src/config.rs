use std::time::Duration;

use tracing::warn;

use crate::event::DEFAULT_HANDLER_TIMEOUT;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// In-memory stores are used when unset
    pub database_url: Option<String>,
    pub bind_address: String,
    pub event_handler_timeout: Duration,
    pub jwt_secret: Option<String>,
    pub database_max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unparsable numbers fall back to
    /// their defaults with a warning
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let event_handler_timeout = parse_or(
            "EVENT_HANDLER_TIMEOUT_SECS",
            non_empty("EVENT_HANDLER_TIMEOUT_SECS"),
            DEFAULT_HANDLER_TIMEOUT.as_secs(),
        );

        Self {
            database_url: non_empty("DATABASE_URL"),
            bind_address: non_empty("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            event_handler_timeout: Duration::from_secs(event_handler_timeout),
            jwt_secret: non_empty("JWT_SECRET"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                non_empty("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            ),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable setting, using default");
            default
        }),
    }
}
