// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    /// Display label resolved from the booking key, e.g. "Hair Salon".
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub datetime: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    /// The consumer who booked.
    pub user_id: i64,
    #[serde(default)]
    pub provider_id: Option<i64>,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Saturates at the latest representable instant, so a stored record
    /// with an absurd duration still compares instead of panicking.
    pub fn end_time(&self) -> DateTime<Utc> {
        checked_end(self.datetime, self.duration_minutes).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_party(&self, user_id: i64) -> bool {
        self.user_id == user_id || self.provider_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Declined,
}

impl AppointmentStatus {
    /// Pending and confirmed appointments still lie ahead of both parties.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Booking keys and the label stored on the appointment.
pub const APPOINTMENT_TYPES: [(&str, &str); 6] = [
    ("hair", "Hair Salon"),
    ("nails", "Nail Salon"),
    ("massage", "Massage Therapy"),
    ("training", "Personal Training"),
    ("spa", "Spa Treatment"),
    ("other", "Other"),
];

/// Unknown keys are stored as given.
pub fn appointment_type_label(key: &str) -> String {
    APPOINTMENT_TYPES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| key.to_string())
}

// ==============================================================================
// COMMAND MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub type_key: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub duration_minutes: i64,
    pub notes: String,
    pub user_id: i64,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotQuery {
    pub start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub provider_id: Option<i64>,
}

impl SlotQuery {
    /// A slot with a positive duration whose end is representable.
    pub fn new(
        start: DateTime<Utc>,
        duration_minutes: i64,
        provider_id: Option<i64>,
    ) -> Result<Self, AppointmentError> {
        if duration_minutes <= 0 {
            return Err(AppointmentError::InvalidInput(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
        if checked_end(start, duration_minutes).is_none() {
            return Err(AppointmentError::InvalidInput(format!(
                "A {} minute appointment starting {} ends out of range",
                duration_minutes, start
            )));
        }

        Ok(Self {
            start,
            duration_minutes,
            provider_id,
        })
    }

    pub fn end(&self) -> DateTime<Utc> {
        checked_end(self.start, self.duration_minutes).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// `start` plus `minutes`, or `None` when the result leaves chrono's range.
pub fn checked_end(start: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|duration| start.checked_add_signed(duration))
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(rename = "type")]
    pub type_key: String,
    pub date: String,
    pub time: String,
    #[serde(alias = "duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub provider_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentQueryParams {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConflictCheckQuery {
    pub date: String,
    pub time: String,
    #[serde(alias = "duration")]
    pub duration_minutes: i64,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
    pub suggested_alternative: Option<SuggestedSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentTypeOption {
    pub key: String,
    pub label: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Time slot conflicts with an existing appointment")]
    SchedulingConflict,

    #[error("Cannot change appointment from {from} to {to}: {reason}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
        reason: String,
    },

    #[error("Appointment {0} not found")]
    NotFound(i64),

    #[error("Not your appointment")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
