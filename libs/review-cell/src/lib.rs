// =====================================================================================
// REVIEW CELL - POST-APPOINTMENT RATINGS
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{NewReview, RatingInput, RatingSummary, Review, ReviewError};
pub use router::{review_routes, ReviewState};
pub use services::{parse_rating, ReviewEligibility, ReviewService};
