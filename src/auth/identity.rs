#[cfg(test)]
use chrono::{Duration, Utc};
#[cfg(test)]
use jsonwebtoken::{encode, EncodingKey, Header};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::shared::AppError;

/// Player on whose behalf a request is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Turns bearer tokens into caller identities
///
/// With a secret, tokens are HS256 JWTs whose `sub` is the player id. Without
/// one the token itself is taken as the player id, which is only meant for
/// local development.
#[derive(Clone)]
pub struct IdentityConfig {
    secret: Option<String>,
}

impl IdentityConfig {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn development() -> Self {
        Self { secret: None }
    }

    #[instrument(skip(self, token))]
    pub fn resolve(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized("Empty bearer token".to_string()));
        }

        let Some(secret) = &self.secret else {
            return Ok(CallerIdentity {
                player_id: token.to_string(),
            });
        };

        let claims = decode::<IdentityClaims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to decode identity token");
            AppError::Unauthorized("Invalid token".to_string())
        })?
        .claims;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        debug!(player_id = %claims.sub, exp = claims.exp, "Identity token decoded");
        Ok(CallerIdentity {
            player_id: claims.sub,
        })
    }
}

/// Token issuing, used by tests to build requests the resolver accepts
#[cfg(test)]
impl IdentityConfig {
    pub fn verifies_tokens(&self) -> bool {
        self.secret.is_some()
    }

    /// Issues a token for `player_id` that [`Self::resolve`] accepts
    #[instrument(skip(self))]
    pub fn create_token(&self, player_id: &str, valid_for: Duration) -> Result<String, AppError> {
        let Some(secret) = &self.secret else {
            return Ok(player_id.to_string());
        };

        let now = Utc::now();
        let claims = IdentityClaims {
            sub: player_id.to_string(),
            exp: (now + valid_for).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode identity token");
            AppError::Internal
        })
    }
}
