// libs/identity-cell/src/middleware.rs
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::router::IdentityState;

/// Refuses a validly signed token whose account has been deleted since it
/// was issued. Requests without a usable token pass through; the routers
/// behind this layer decide whether they need one.
pub async fn reject_removed_accounts(
    State(state): State<IdentityState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token_user = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| validate_token(token, &state.config.jwt_secret).ok());

    if let Some(user) = token_user {
        if state.identity.get_user(user.id).await.is_none() {
            warn!("Rejected token for removed account {}", user.id);
            return Err(AppError::Auth("Account no longer exists".to_string()));
        }
    }

    Ok(next.run(request).await)
}
