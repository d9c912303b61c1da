// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Declined],
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Completed],
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Declined => vec![],
        }
    }

    /// Validate that `appointment` may move to `target` at `now`.
    pub fn validate_status_transition(
        &self,
        appointment: &Appointment,
        target: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let current = appointment.status;
        debug!("Validating status transition from {} to {}", current, target);

        if !self.get_valid_transitions(current).contains(&target) {
            warn!(
                "Invalid status transition attempted on {}: {} -> {}",
                appointment.id, current, target
            );
            return Err(AppointmentError::InvalidTransition {
                from: current,
                to: target,
                reason: format!("only {} appointments can be {}", required_status(target), target),
            });
        }

        if target == AppointmentStatus::Completed && now < appointment.datetime {
            warn!("Early completion attempted on appointment {}", appointment.id);
            return Err(AppointmentError::InvalidTransition {
                from: current,
                to: target,
                reason: "cannot complete appointment before its scheduled time".to_string(),
            });
        }

        Ok(())
    }

    /// The acting user must be the appointment's provider.
    pub fn authorize_provider(
        &self,
        appointment: &Appointment,
        acting_user_id: i64,
    ) -> Result<(), AppointmentError> {
        if appointment.provider_id == Some(acting_user_id) {
            Ok(())
        } else {
            warn!(
                "User {} tried to manage appointment {} they do not provide",
                acting_user_id, appointment.id
            );
            Err(AppointmentError::Unauthorized)
        }
    }
}

fn required_status(target: AppointmentStatus) -> AppointmentStatus {
    match target {
        AppointmentStatus::Completed => AppointmentStatus::Confirmed,
        _ => AppointmentStatus::Pending,
    }
}
