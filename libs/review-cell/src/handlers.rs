// libs/review-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{ReviewError, SubmitReviewRequest};
use crate::router::ReviewState;

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidRating => AppError::ValidationError(err.to_string()),
            ReviewError::DuplicateReview => AppError::Conflict(err.to_string()),
            ReviewError::NotCompleted(_) | ReviewError::NoCounterparty(_) => {
                AppError::BadRequest(err.to_string())
            }
            ReviewError::NotAParty => AppError::Forbidden(err.to_string()),
            ReviewError::NotFound(_) => AppError::NotFound(err.to_string()),
            ReviewError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

pub async fn submit_review(
    State(state): State<ReviewState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    debug!("User {} reviewing appointment {}", user.id, appointment_id);

    let appointment = state
        .scheduling
        .get_appointment(appointment_id)
        .await
        .ok_or(ReviewError::NotFound(appointment_id))?;

    let rating = request.rating.resolve()?;
    let review = state
        .reviews
        .submit_review(&appointment, user.id, rating, &request.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "review": review,
            "message": "Review submitted successfully"
        })),
    ))
}

pub async fn my_review_for_appointment(
    State(state): State<ReviewState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Json<Value> {
    let review = state.reviews.review_for_appointment(appointment_id, user.id).await;

    Json(json!({ "review": review }))
}

pub async fn received_reviews(
    State(state): State<ReviewState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Value> {
    let reviews = state.reviews.reviews_for(user.id).await;
    let summary = state.reviews.rating_summary(user.id).await;

    Json(json!({
        "reviews": reviews,
        "average_rating": summary.average_rating,
        "total_reviews": summary.total_reviews
    }))
}

pub async fn written_reviews(
    State(state): State<ReviewState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Value> {
    let reviews = state.reviews.reviews_by(user.id).await;

    Json(json!({ "reviews": reviews }))
}
