// libs/review-cell/src/services/eligibility.rs
use tracing::{debug, warn};

use appointment_cell::{Appointment, AppointmentStatus};

use crate::models::{RatingInput, ReviewError, MAX_RATING, MIN_RATING};

/// Who may review an appointment, and whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewEligibility {
    pub appointment_id: i64,
    pub reviewer_id: i64,
    pub reviewed_id: i64,
}

impl ReviewEligibility {
    /// The appointment must be completed and the reviewer one of its
    /// parties. A consumer reviews the provider, a provider the consumer.
    pub fn evaluate(appointment: &Appointment, reviewer_id: i64) -> Result<Self, ReviewError> {
        debug!(
            "Checking review eligibility of user {} on appointment {}",
            reviewer_id, appointment.id
        );

        if !appointment.is_party(reviewer_id) {
            warn!(
                "User {} is not a party to appointment {}",
                reviewer_id, appointment.id
            );
            return Err(ReviewError::NotAParty);
        }

        if appointment.status != AppointmentStatus::Completed {
            return Err(ReviewError::NotCompleted(appointment.status));
        }

        let reviewed_id = if appointment.user_id == reviewer_id {
            appointment
                .provider_id
                .ok_or(ReviewError::NoCounterparty(appointment.id))?
        } else {
            appointment.user_id
        };

        Ok(Self {
            appointment_id: appointment.id,
            reviewer_id,
            reviewed_id,
        })
    }
}

/// Integer text in `1..=5`.
pub fn parse_rating(raw: &str) -> Result<i64, ReviewError> {
    let rating = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ReviewError::InvalidRating)?;
    check_rating(rating)
}

pub fn check_rating(rating: i64) -> Result<i64, ReviewError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ReviewError::InvalidRating)
    }
}

impl RatingInput {
    pub fn resolve(&self) -> Result<i64, ReviewError> {
        match self {
            RatingInput::Number(value) => check_rating(*value),
            RatingInput::Text(raw) => parse_rating(raw),
        }
    }
}
