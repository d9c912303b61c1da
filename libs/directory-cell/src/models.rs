// libs/directory-cell/src/models.rs
use serde::{Deserialize, Serialize};

use appointment_cell::Appointment;
use identity_cell::{PublicUser, WeeklyAvailability};
use review_cell::Review;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const ANONYMOUS_NAME: &str = "Anonymous";

// ==============================================================================
// PROVIDER LISTINGS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderListing {
    #[serde(flatten)]
    pub provider: PublicUser,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfileView {
    pub provider: PublicUser,
    /// Newest first.
    pub reviews: Vec<DetailedReview>,
    pub average_rating: f64,
    pub total_reviews: usize,
    pub upcoming_appointments: usize,
}

/// Schedule-form entry for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookableProvider {
    pub id: i64,
    pub name: String,
    pub business_name: String,
    pub service_category: String,
    pub availability: WeeklyAvailability,
}

/// Map entry for providers that published an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatedProvider {
    pub id: i64,
    pub business_name: String,
    pub service_category: String,
    pub address: String,
    pub business_description: String,
    pub services_offered: String,
    pub phone: String,
    pub email: String,
}

// ==============================================================================
// REVIEW VIEWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedReview {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: String,
    pub reviewed_name: String,
    pub appointment_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewBoard {
    pub received: Vec<DetailedReview>,
    pub written: Vec<DetailedReview>,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicReview {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicReviews {
    pub reviews: Vec<PublicReview>,
    /// Rounded to one decimal.
    pub average_rating: f64,
    pub total_reviews: usize,
}

// ==============================================================================
// BOOKING VIEWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderBookings {
    pub pending: Vec<BookingView>,
    pub confirmed: Vec<BookingView>,
    pub completed: Vec<BookingView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub user: PublicUser,
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
    pub past_appointments: usize,
    /// Soonest active bookings.
    pub next_appointments: Vec<Appointment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub past_bookings: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Provider {0} not found")]
    ProviderNotFound(i64),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {0} is not a provider")]
    NotAProvider(i64),
}
