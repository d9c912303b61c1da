// apps/api/src/account.rs
use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use appointment_cell::SchedulingService;
use identity_cell::IdentityService;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

#[derive(Clone)]
pub struct AccountState {
    pub identity: Arc<IdentityService>,
    pub scheduling: Arc<SchedulingService>,
}

/// Removes the caller's account and every appointment they booked.
/// Reviews stay; their names resolve to placeholders from then on.
pub async fn delete_account(
    State(state): State<AccountState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    state.identity.delete_user(user.id).await?;

    let removed = state
        .scheduling
        .remove_for_consumer(user.id)
        .await
        .map_err(|e| {
            error!("User {} deleted but their appointments were kept: {}", user.id, e);
            AppError::from(e)
        })?;

    info!("Account {} deleted with {} appointments", user.id, removed);

    Ok(Json(json!({
        "success": true,
        "removed_appointments": removed
    })))
}
