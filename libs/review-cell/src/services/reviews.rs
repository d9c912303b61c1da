// libs/review-cell/src/services/reviews.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use appointment_cell::Appointment;
use shared_database::CollectionStore;

use crate::models::{NewReview, RatingSummary, Review, ReviewError};
use crate::services::eligibility::{check_rating, ReviewEligibility};

/// The review engine. Reviews are append-only and unique per
/// (appointment, reviewer).
pub struct ReviewService {
    store: Arc<dyn CollectionStore<Review>>,
    reviews: Mutex<Vec<Review>>,
}

impl ReviewService {
    pub async fn load(store: Arc<dyn CollectionStore<Review>>) -> Result<Self, ReviewError> {
        let reviews = store.load().await?;
        info!("Review engine loaded {} reviews", reviews.len());

        Ok(Self {
            store,
            reviews: Mutex::new(reviews),
        })
    }

    pub async fn add_review(&self, new_review: NewReview) -> Result<Review, ReviewError> {
        let mut reviews = self.reviews.lock().await;
        self.append(&mut reviews, new_review).await
    }

    /// Checks eligibility against `appointment` and records the review in
    /// one step.
    pub async fn submit_review(
        &self,
        appointment: &Appointment,
        reviewer_id: i64,
        rating: i64,
        comment: &str,
    ) -> Result<Review, ReviewError> {
        let eligibility = ReviewEligibility::evaluate(appointment, reviewer_id)?;

        let mut reviews = self.reviews.lock().await;
        self.append(
            &mut reviews,
            NewReview {
                appointment_id: eligibility.appointment_id,
                reviewer_id: eligibility.reviewer_id,
                reviewed_id: eligibility.reviewed_id,
                rating,
                comment: comment.to_string(),
            },
        )
        .await
    }

    /// Reviews the user received.
    pub async fn reviews_for(&self, user_id: i64) -> Vec<Review> {
        let reviews = self.reviews.lock().await;
        reviews.iter().filter(|r| r.reviewed_id == user_id).cloned().collect()
    }

    /// Reviews the user wrote.
    pub async fn reviews_by(&self, user_id: i64) -> Vec<Review> {
        let reviews = self.reviews.lock().await;
        reviews.iter().filter(|r| r.reviewer_id == user_id).cloned().collect()
    }

    pub async fn review_for_appointment(&self, appointment_id: i64, reviewer_id: i64) -> Option<Review> {
        let reviews = self.reviews.lock().await;
        reviews
            .iter()
            .find(|r| r.appointment_id == appointment_id && r.reviewer_id == reviewer_id)
            .cloned()
    }

    /// Mean received rating, `0.0` without reviews.
    pub async fn calculate_average_rating(&self, user_id: i64) -> f64 {
        self.rating_summary(user_id).await.average_rating
    }

    pub async fn rating_summary(&self, user_id: i64) -> RatingSummary {
        let reviews = self.reviews.lock().await;
        summarize(reviews.iter().filter(|r| r.reviewed_id == user_id))
    }

    async fn append(
        &self,
        reviews: &mut Vec<Review>,
        new_review: NewReview,
    ) -> Result<Review, ReviewError> {
        debug!(
            "Review of user {} by user {} for appointment {}",
            new_review.reviewed_id, new_review.reviewer_id, new_review.appointment_id
        );

        let rating = u8::try_from(check_rating(new_review.rating)?)
            .map_err(|_| ReviewError::InvalidRating)?;

        if reviews
            .iter()
            .any(|r| r.appointment_id == new_review.appointment_id && r.reviewer_id == new_review.reviewer_id)
        {
            warn!(
                "Duplicate review by user {} on appointment {}",
                new_review.reviewer_id, new_review.appointment_id
            );
            return Err(ReviewError::DuplicateReview);
        }

        let review = Review {
            id: reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            appointment_id: new_review.appointment_id,
            reviewer_id: new_review.reviewer_id,
            reviewed_id: new_review.reviewed_id,
            rating,
            comment: new_review.comment.trim().to_string(),
            created_at: Utc::now(),
        };

        let mut working = reviews.clone();
        working.push(review.clone());
        self.store.save(&working).await?;
        *reviews = working;

        info!("Review {} recorded for appointment {}", review.id, review.appointment_id);
        Ok(review)
    }
}

fn summarize<'a>(received: impl Iterator<Item = &'a Review>) -> RatingSummary {
    let (total, count) = received.fold((0u64, 0usize), |(sum, n), r| (sum + u64::from(r.rating), n + 1));

    RatingSummary {
        average_rating: if count == 0 { 0.0 } else { total as f64 / count as f64 },
        total_reviews: count,
    }
}
