// libs/appointment-cell/src/services/scheduling.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shared_config::ConflictScope;
use shared_database::{CollectionStore, IdSequence, SequenceMark};

use crate::models::{
    appointment_type_label, Appointment, AppointmentError, AppointmentStatus,
    ConflictCheckResponse, NewAppointment, SlotQuery, SuggestedSlot,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;

/// The scheduling engine. Owns the appointment collection and is the only
/// writer of it.
pub struct SchedulingService {
    store: Arc<dyn CollectionStore<Appointment>>,
    appointments: Mutex<Vec<Appointment>>,
    ids: IdSequence,
    conflicts: ConflictDetectionService,
    lifecycle: AppointmentLifecycleService,
}

impl SchedulingService {
    /// `ids` holds the appointment id high-water mark. Cancelled ids are
    /// never reused, so reviews keyed by them stay attached to the right
    /// booking.
    pub async fn load(
        store: Arc<dyn CollectionStore<Appointment>>,
        ids: Arc<dyn CollectionStore<SequenceMark>>,
        scope: ConflictScope,
    ) -> Result<Self, AppointmentError> {
        let appointments = store.load().await?;
        let highest = appointments.iter().map(|apt| apt.id).max().unwrap_or(0);
        let ids = IdSequence::load(ids, highest).await?;
        info!(
            "Scheduling engine loaded {} appointments (conflict scope: {})",
            appointments.len(),
            scope
        );

        Ok(Self {
            store,
            appointments: Mutex::new(appointments),
            ids,
            conflicts: ConflictDetectionService::new(scope),
            lifecycle: AppointmentLifecycleService::new(),
        })
    }

    pub fn lifecycle(&self) -> &AppointmentLifecycleService {
        &self.lifecycle
    }

    pub async fn add_appointment(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking {} on {} {} for user {}",
            request.type_key, request.date, request.time, request.user_id
        );

        let start = parse_slot_start(&request.date, &request.time)?;
        let slot = SlotQuery::new(start, request.duration_minutes, request.provider_id)?;

        let mut appointments = self.appointments.lock().await;

        if self.conflicts.has_conflict(&appointments, &slot) {
            warn!("Booking rejected, slot {} is taken", start);
            return Err(AppointmentError::SchedulingConflict);
        }

        let appointment = Appointment {
            id: self.ids.next_id().await?,
            appointment_type: appointment_type_label(&request.type_key),
            datetime: start,
            duration_minutes: request.duration_minutes,
            notes: request.notes,
            created_at: Utc::now(),
            user_id: request.user_id,
            provider_id: request.provider_id,
            status: AppointmentStatus::Pending,
            completed_at: None,
        };

        let mut working = appointments.clone();
        working.push(appointment.clone());
        self.store.save(&working).await?;
        *appointments = working;

        info!("Appointment {} booked for user {}", appointment.id, appointment.user_id);
        Ok(appointment)
    }

    /// Removes the appointment. Callers decide who may cancel.
    pub async fn cancel_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.lock().await;

        let position = appointments
            .iter()
            .position(|apt| apt.id == appointment_id)
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        let mut working = appointments.clone();
        let removed = working.remove(position);
        self.store.save(&working).await?;
        *appointments = working;

        info!("Appointment {} cancelled", appointment_id);
        Ok(removed)
    }

    /// Applies a lifecycle transition. Provider ownership is checked by the
    /// caller through [`AppointmentLifecycleService::authorize_provider`].
    pub async fn update_status(
        &self,
        appointment_id: i64,
        target: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.lock().await;
        let mut working = appointments.clone();

        let appointment = working
            .iter_mut()
            .find(|apt| apt.id == appointment_id)
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        self.lifecycle.validate_status_transition(appointment, target, now)?;

        appointment.status = target;
        if target == AppointmentStatus::Completed {
            appointment.completed_at = Some(now);
        }
        let updated = appointment.clone();

        self.store.save(&working).await?;
        *appointments = working;

        info!("Appointment {} is now {}", appointment_id, target);
        Ok(updated)
    }

    /// Without a filter: every appointment, earliest first. With a
    /// `YYYY-MM-DD` filter: that day's appointments in storage order; an
    /// unparseable filter matches nothing.
    pub async fn get_appointments(&self, date_filter: Option<&str>) -> Vec<Appointment> {
        let appointments = self.appointments.lock().await;

        match date_filter {
            Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(day) => appointments
                    .iter()
                    .filter(|apt| apt.datetime.date_naive() == day)
                    .cloned()
                    .collect(),
                Err(_) => {
                    debug!("Ignoring unparseable date filter '{}'", raw);
                    Vec::new()
                }
            },
            None => {
                let mut all = appointments.clone();
                all.sort_by_key(|apt| apt.datetime);
                all
            }
        }
    }

    pub async fn get_appointment(&self, appointment_id: i64) -> Option<Appointment> {
        let appointments = self.appointments.lock().await;
        appointments.iter().find(|apt| apt.id == appointment_id).cloned()
    }

    pub async fn appointments_for_consumer(&self, user_id: i64) -> Vec<Appointment> {
        self.sorted_where(|apt| apt.user_id == user_id).await
    }

    pub async fn appointments_for_provider(&self, provider_id: i64) -> Vec<Appointment> {
        self.sorted_where(|apt| apt.provider_id == Some(provider_id)).await
    }

    /// Active appointments at or after `now`, soonest first.
    pub async fn upcoming_for_consumer(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<Appointment> {
        let mut upcoming = self
            .sorted_where(|apt| apt.user_id == user_id && apt.status.is_active() && apt.datetime >= now)
            .await;
        upcoming.truncate(limit);
        upcoming
    }

    /// Most recent first.
    pub async fn history_for_consumer(&self, user_id: i64) -> Vec<Appointment> {
        let mut history = self.appointments_for_consumer(user_id).await;
        history.reverse();
        history
    }

    /// Drops every appointment the user booked. Returns how many went.
    pub async fn remove_for_consumer(&self, user_id: i64) -> Result<usize, AppointmentError> {
        let mut appointments = self.appointments.lock().await;

        let mut working = appointments.clone();
        working.retain(|apt| apt.user_id != user_id);
        let removed = appointments.len() - working.len();
        if removed == 0 {
            return Ok(0);
        }

        self.store.save(&working).await?;
        *appointments = working;

        info!("Removed {} appointments for user {}", removed, user_id);
        Ok(removed)
    }

    pub async fn check_conflicts(&self, slot: &SlotQuery) -> ConflictCheckResponse {
        let appointments = self.appointments.lock().await;
        self.conflicts.check_conflicts(&appointments, slot)
    }

    pub async fn next_available_slot(
        &self,
        provider_id: Option<i64>,
        preferred_start: DateTime<Utc>,
        duration_minutes: i64,
        max_search_days: i64,
    ) -> Option<SuggestedSlot> {
        let appointments = self.appointments.lock().await;
        self.conflicts.find_next_available_slot(
            &appointments,
            provider_id,
            preferred_start,
            duration_minutes,
            max_search_days,
        )
    }

    async fn sorted_where<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let appointments = self.appointments.lock().await;
        let mut selected: Vec<Appointment> =
            appointments.iter().filter(|apt| keep(apt)).cloned().collect();
        selected.sort_by_key(|apt| apt.datetime);
        selected
    }
}

/// Parses `YYYY-MM-DD` and `HH:MM` into one UTC instant.
pub fn parse_slot_start(date: &str, time: &str) -> Result<DateTime<Utc>, AppointmentError> {
    let raw = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| AppointmentError::InvalidInput(format!("Invalid date or time: '{}'", raw)))
}
