use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Resolves `Authorization: Bearer <token>` into a [`CallerIdentity`] request
/// extension.
///
/// Requests without the header continue anonymously; a header that is present
/// but unusable is rejected with 401.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::identify_caller))
///
/// [`CallerIdentity`]: super::CallerIdentity
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn identify_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = req.headers().get("Authorization") else {
        debug!("No Authorization header, continuing anonymously");
        return Ok(next.run(req).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Invalid Authorization header format (expected Bearer token)");
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;

    let identity = state.identity.resolve(token).map_err(|e| {
        warn!(error = %e, "Caller identification failed");
        e
    })?;

    debug!(player_id = %identity.player_id, "Caller identified");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
