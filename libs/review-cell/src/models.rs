// libs/review-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use appointment_cell::AppointmentStatus;
use shared_database::StoreError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A rating one party of a completed appointment left for the other.
/// Reviews are never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub appointment_id: i64,
    pub reviewer_id: i64,
    pub reviewed_id: i64,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub appointment_id: i64,
    pub reviewer_id: i64,
    pub reviewed_id: i64,
    pub rating: i64,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: usize,
}

impl RatingSummary {
    /// Average rounded to one decimal place.
    pub fn rounded_average(&self) -> f64 {
        (self.average_rating * 10.0).round() / 10.0
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Ratings arrive either as JSON numbers or as form-style text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: RatingInput,
    #[serde(default)]
    pub comment: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5 stars")]
    InvalidRating,

    #[error("You have already reviewed this appointment")]
    DuplicateReview,

    #[error("You can only review completed appointments (status is {0})")]
    NotCompleted(AppointmentStatus),

    #[error("You can only review appointments you are involved in")]
    NotAParty,

    #[error("Appointment {0} has no one to review")]
    NoCounterparty(i64),

    #[error("Appointment {0} not found")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
