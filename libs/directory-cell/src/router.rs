// libs/directory-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::DirectoryService;

#[derive(Clone)]
pub struct DirectoryState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<DirectoryService>,
}

pub fn directory_routes(state: DirectoryState) -> Router {
    let public_routes = Router::new()
        .route("/providers", get(handlers::providers_by_category))
        .route("/providers/bookable", get(handlers::bookable_providers))
        .route("/providers/located", get(handlers::located_providers))
        .route("/providers/{provider_id}", get(handlers::provider_profile))
        .route("/users/{user_id}/reviews", get(handlers::public_reviews));

    let protected_routes = Router::new()
        .route("/me/summary", get(handlers::my_summary))
        .route("/me/reviews", get(handlers::my_reviews))
        .route("/me/bookings", get(handlers::my_bookings))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
