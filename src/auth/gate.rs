use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::auth::extractors::Identity;
use crate::state::AppState;

/// Resolves the caller once per request and stores an [`Identity`] in the
/// request extensions. Never rejects: handlers decide whether they need a user.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = state.config.token_transport.extract(req.headers());

    let user_id = match token.as_deref() {
        None => None,
        Some(token) => match state.sessions.resolve_user(token).await {
            Ok(Some(user_id)) => {
                debug!(%user_id, "session resolved");
                Some(user_id)
            }
            Ok(None) => {
                debug!("unknown or expired session");
                None
            }
            Err(e) => {
                error!(error = %e, "session lookup failed; treating request as anonymous");
                None
            }
        },
    };

    req.extensions_mut().insert(Identity { token, user_id });
    next.run(req).await
}
