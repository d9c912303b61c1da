// =====================================================================================
// IDENTITY CELL - ACCOUNTS, AUTHENTICATION AND PROVIDER PROFILES
// =====================================================================================

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Account, DayAvailability, GalleryImage, IdentityError, NewAccount, NewGalleryImage,
    NewUser, ProfileUpdate, ProviderDetails, ProviderProfile, ProviderProfileUpdate,
    PublicUser, User, Weekday, WeeklyAvailability,
};
pub use middleware::reject_removed_accounts;
pub use router::{identity_routes, IdentityState};
pub use services::{IdentityService, PasswordService};
