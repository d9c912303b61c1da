// libs/directory-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{
    BookableProvider, DirectoryError, LocatedProvider, ProfileSummary, ProviderBookings,
    ProviderListing, ProviderProfileView, PublicReviews, ReviewBoard,
};
use crate::router::DirectoryState;

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::ProviderNotFound(_)
            | DirectoryError::UserNotFound(_)
            | DirectoryError::NotAProvider(_) => AppError::NotFound(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn providers_by_category(
    State(state): State<DirectoryState>,
    Query(query): Query<CategoryQuery>,
) -> Json<Vec<ProviderListing>> {
    Json(state.directory.providers_by_category(&query.category).await)
}

pub async fn bookable_providers(State(state): State<DirectoryState>) -> Json<Vec<BookableProvider>> {
    Json(state.directory.bookable_providers().await)
}

pub async fn located_providers(State(state): State<DirectoryState>) -> Json<Vec<LocatedProvider>> {
    Json(state.directory.located_providers().await)
}

pub async fn provider_profile(
    State(state): State<DirectoryState>,
    Path(provider_id): Path<i64>,
) -> Result<Json<ProviderProfileView>, AppError> {
    Ok(Json(state.directory.provider_profile(provider_id, Utc::now()).await?))
}

pub async fn public_reviews(
    State(state): State<DirectoryState>,
    Path(user_id): Path<i64>,
) -> Json<PublicReviews> {
    Json(state.directory.public_reviews(user_id).await)
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn my_summary(
    State(state): State<DirectoryState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileSummary>, AppError> {
    Ok(Json(state.directory.profile_summary(user.id, Utc::now()).await?))
}

pub async fn my_reviews(
    State(state): State<DirectoryState>,
    Extension(user): Extension<AuthUser>,
) -> Json<ReviewBoard> {
    Json(state.directory.review_board(user.id).await)
}

pub async fn my_bookings(
    State(state): State<DirectoryState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProviderBookings>, AppError> {
    if !user.is_provider() {
        return Err(AppError::Forbidden(
            "Only providers can access this page".to_string(),
        ));
    }

    Ok(Json(state.directory.provider_bookings(user.id).await?))
}
