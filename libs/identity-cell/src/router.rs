// libs/identity-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::IdentityService;

#[derive(Clone)]
pub struct IdentityState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<IdentityService>,
}

pub fn identity_routes(state: IdentityState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .route("/me/availability", put(handlers::update_availability))
        .route("/me/gallery", post(handlers::upload_gallery_image))
        .route("/me/gallery/{image_id}", delete(handlers::delete_gallery_image))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
