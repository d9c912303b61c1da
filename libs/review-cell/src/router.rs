// libs/review-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use appointment_cell::SchedulingService;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::ReviewService;

#[derive(Clone)]
pub struct ReviewState {
    pub config: Arc<AppConfig>,
    pub reviews: Arc<ReviewService>,
    pub scheduling: Arc<SchedulingService>,
}

pub fn review_routes(state: ReviewState) -> Router {
    let protected_routes = Router::new()
        .route("/appointments/{appointment_id}", post(handlers::submit_review))
        .route(
            "/appointments/{appointment_id}/mine",
            get(handlers::my_review_for_appointment),
        )
        .route("/received", get(handlers::received_reviews))
        .route("/written", get(handlers::written_reviews))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
