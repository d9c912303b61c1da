pub mod identity;
pub mod password;
pub mod validation;

pub use identity::IdentityService;
pub use password::PasswordService;
