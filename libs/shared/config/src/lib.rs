use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
/// One year. Longer lifetimes fall back to the default.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Which existing appointments a new booking is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictScope {
    /// Every stored appointment, regardless of provider.
    #[default]
    Global,
    /// Only appointments booked with the same provider.
    Provider,
}

impl FromStr for ConflictScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(ConflictScope::Global),
            "provider" | "per_provider" => Ok(ConflictScope::Provider),
            other => Err(format!("unknown conflict scope '{}'", other)),
        }
    }
}

impl fmt::Display for ConflictScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictScope::Global => write!(f, "global"),
            ConflictScope::Provider => write!(f, "provider"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bind_addr: SocketAddr,
    pub conflict_scope: ConflictScope,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Missing or
    /// malformed values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("BOOKWELL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                warn!("BOOKWELL_DATA_DIR not set, using {}", DEFAULT_DATA_DIR);
                PathBuf::from(DEFAULT_DATA_DIR)
            });

        let jwt_secret = lookup("BOOKWELL_JWT_SECRET").unwrap_or_else(|| {
            warn!("BOOKWELL_JWT_SECRET not set, using empty value");
            String::new()
        });

        let token_ttl_hours = match lookup("BOOKWELL_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| (1..=MAX_TOKEN_TTL_HOURS).contains(hours))
                .unwrap_or_else(|| {
                    warn!("BOOKWELL_TOKEN_TTL_HOURS '{}' is invalid, using default", raw);
                    DEFAULT_TOKEN_TTL_HOURS
                }),
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let default_addr = SocketAddr::from(([0, 0, 0, 0], 5000));
        let bind_addr = match lookup("BOOKWELL_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|_| {
                warn!("BOOKWELL_BIND_ADDR '{}' is invalid, using {}", raw, DEFAULT_BIND_ADDR);
                default_addr
            }),
            None => default_addr,
        };

        let conflict_scope = match lookup("BOOKWELL_CONFLICT_SCOPE") {
            Some(raw) => raw.parse::<ConflictScope>().unwrap_or_else(|e| {
                warn!("{}, using global conflict scope", e);
                ConflictScope::Global
            }),
            None => ConflictScope::Global,
        };

        let config = Self {
            data_dir,
            jwt_secret,
            token_ttl_hours,
            bind_addr,
            conflict_scope,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - token signing is disabled");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn appointments_path(&self) -> PathBuf {
        self.data_dir.join("appointments.json")
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.data_dir.join("reviews.json")
    }

    /// High-water mark for user ids.
    pub fn user_ids_path(&self) -> PathBuf {
        self.data_dir.join("users.seq.json")
    }

    pub fn appointment_ids_path(&self) -> PathBuf {
        self.data_dir.join("appointments.seq.json")
    }
}
