pub mod eligibility;
pub mod reviews;

pub use eligibility::{parse_rating, ReviewEligibility};
pub use reviews::ReviewService;
