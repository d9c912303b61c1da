// =====================================================================================
// DIRECTORY CELL - READ-ONLY LISTINGS ACROSS USERS, APPOINTMENTS AND REVIEWS
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    BookableProvider, BookingView, DetailedReview, DirectoryError, LocatedProvider,
    ProfileSummary, ProviderBookings, ProviderListing, ProviderProfileView, ProviderStats,
    PublicReview, PublicReviews, ReviewBoard,
};
pub use router::{directory_routes, DirectoryState};
pub use services::DirectoryService;
