// apps/api/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use appointment_cell::{appointment_routes, AppointmentState};
use directory_cell::{directory_routes, DirectoryState};
use identity_cell::{identity_routes, reject_removed_accounts, IdentityState};
use review_cell::{review_routes, ReviewState};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::account::{self, AccountState};
use crate::services::AppServices;

pub fn create_router(config: Arc<AppConfig>, services: AppServices) -> Router {
    let account_routes = Router::new()
        .route("/", delete(account::delete_account))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(AccountState {
            identity: services.identity.clone(),
            scheduling: services.scheduling.clone(),
        });

    let identity_state = IdentityState {
        config: config.clone(),
        identity: services.identity.clone(),
    };

    Router::new()
        .route("/", get(|| async { "Bookwell API is running!" }))
        .nest("/auth", identity_routes(identity_state.clone()))
        .nest(
            "/appointments",
            appointment_routes(AppointmentState {
                config: config.clone(),
                scheduling: services.scheduling.clone(),
            }),
        )
        .nest(
            "/reviews",
            review_routes(ReviewState {
                config: config.clone(),
                reviews: services.reviews.clone(),
                scheduling: services.scheduling.clone(),
            }),
        )
        .nest(
            "/directory",
            directory_routes(DirectoryState {
                config: config.clone(),
                directory: services.directory.clone(),
            }),
        )
        .nest("/account", account_routes)
        .layer(middleware::from_fn_with_state(
            identity_state,
            reject_removed_accounts,
        ))
}
