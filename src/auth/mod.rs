// Caller identification for the read API

mod identity;
mod middleware;

pub use identity::{CallerIdentity, IdentityClaims, IdentityConfig};
pub use middleware::identify_caller;
