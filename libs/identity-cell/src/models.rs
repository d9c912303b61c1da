// libs/identity-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::auth::Role;

// ==============================================================================
// CORE USER MODELS
// ==============================================================================

/// A stored account. The password hash never leaves the identity cell;
/// everything handed to callers goes through [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub account: Account,
}

/// Role-specific part of an account. Provider-only fields live on the
/// provider variant and cannot be reached for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Account {
    Consumer,
    Provider(ProviderProfile),
}

impl Account {
    pub fn role(&self) -> Role {
        match self {
            Account::Consumer => Role::Consumer,
            Account::Provider(_) => Role::Provider,
        }
    }

    pub fn provider_profile(&self) -> Option<&ProviderProfile> {
        match self {
            Account::Provider(profile) => Some(profile),
            Account::Consumer => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub business_description: String,
    #[serde(default)]
    pub service_category: String,
    #[serde(default)]
    pub services_offered: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_weekly_availability")]
    pub availability: WeeklyAvailability,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weekday::Monday => write!(f, "monday"),
            Weekday::Tuesday => write!(f, "tuesday"),
            Weekday::Wednesday => write!(f, "wednesday"),
            Weekday::Thursday => write!(f, "thursday"),
            Weekday::Friday => write!(f, "friday"),
            Weekday::Saturday => write!(f, "saturday"),
            Weekday::Sunday => write!(f, "sunday"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub enabled: bool,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

pub type WeeklyAvailability = BTreeMap<Weekday, DayAvailability>;

/// Weekdays 09:00-17:00, weekends closed.
pub fn default_weekly_availability() -> WeeklyAvailability {
    let opens = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    let closes = NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN);

    Weekday::ALL
        .iter()
        .map(|day| {
            (
                *day,
                DayAvailability {
                    enabled: !day.is_weekend(),
                    start: opens,
                    end: closes,
                },
            )
        })
        .collect()
}

/// `HH:MM` on the wire; `HH:MM:SS` is accepted on input.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: i64,
    pub filename: String,
    /// `data:image/<ext>;base64,...`
    pub data: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

/// Sanitized user view: every field except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub account: Account,
}

impl PublicUser {
    pub fn role(&self) -> Role {
        self.account.role()
    }

    pub fn is_provider(&self) -> bool {
        self.role() == Role::Provider
    }

    /// Business name for providers that set one, otherwise the display name.
    pub fn display_name(&self) -> &str {
        match &self.account {
            Account::Provider(profile) if !profile.business_name.is_empty() => {
                &profile.business_name
            }
            _ => &self.name,
        }
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            name: user.name.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at,
            account: user.account.clone(),
        }
    }
}

// ==============================================================================
// COMMAND MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub account: NewAccount,
}

#[derive(Debug, Clone)]
pub enum NewAccount {
    Consumer,
    Provider(ProviderDetails),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderDetails {
    pub business_name: String,
    #[serde(default)]
    pub business_description: String,
    pub service_category: String,
    #[serde(default)]
    pub services_offered: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub availability: Option<WeeklyAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    /// Applied to providers only.
    #[serde(default)]
    pub provider: Option<ProviderProfileUpdate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderProfileUpdate {
    pub business_name: Option<String>,
    pub business_description: Option<String>,
    pub service_category: Option<String>,
    pub services_offered: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGalleryImage {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub description: String,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub provider: Option<ProviderDetails>,
}

fn default_role() -> Role {
    Role::Consumer
}

impl RegisterRequest {
    pub fn into_new_user(self) -> Result<NewUser, IdentityError> {
        if self.password != self.confirm_password {
            return Err(IdentityError::Validation("Passwords do not match".to_string()));
        }

        let account = match self.role {
            Role::Consumer => NewAccount::Consumer,
            Role::Provider => NewAccount::Provider(self.provider.unwrap_or_default()),
        };

        Ok(NewUser {
            username: self.username,
            password: self.password,
            email: self.email,
            phone: self.phone,
            name: self.name,
            account,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryUploadRequest {
    pub filename: String,
    /// Standard base64 of the raw image bytes.
    pub content_base64: String,
    #[serde(default)]
    pub description: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username '{0}' already exists")]
    UsernameTaken(String),

    #[error("User {0} not found")]
    NotFound(i64),

    #[error("User {0} is not a provider")]
    NotAProvider(i64),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Gallery image {0} not found")]
    ImageNotFound(i64),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
