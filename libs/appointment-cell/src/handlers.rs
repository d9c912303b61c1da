// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentQueryParams, AppointmentStatus,
    AppointmentTypeOption, BookAppointmentRequest, ConflictCheckQuery, ConflictCheckResponse,
    NewAppointment, SlotQuery, APPOINTMENT_TYPES,
};
use crate::router::AppointmentState;
use crate::services::parse_slot_start;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::InvalidInput(msg) => AppError::BadRequest(msg),
            AppointmentError::SchedulingConflict => AppError::Conflict(err.to_string()),
            AppointmentError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            AppointmentError::NotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

pub async fn list_appointment_types() -> Json<Vec<AppointmentTypeOption>> {
    Json(
        APPOINTMENT_TYPES
            .iter()
            .map(|(key, label)| AppointmentTypeOption {
                key: key.to_string(),
                label: label.to_string(),
            })
            .collect(),
    )
}

pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state
        .scheduling
        .add_appointment(NewAppointment {
            type_key: request.type_key,
            date: request.date,
            time: request.time,
            duration_minutes: request.duration_minutes,
            notes: request.notes,
            user_id: user.id,
            provider_id: request.provider_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment request submitted. Waiting for provider confirmation."
        })),
    ))
}

/// Appointments the caller takes part in, optionally narrowed to one day.
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AppointmentQueryParams>,
) -> Json<Vec<Appointment>> {
    let appointments = state
        .scheduling
        .get_appointments(params.date.as_deref())
        .await
        .into_iter()
        .filter(|apt| apt.is_party(user.id))
        .collect();

    Json(appointments)
}

pub async fn my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Appointment>> {
    let appointments = if user.is_provider() {
        state.scheduling.appointments_for_provider(user.id).await
    } else {
        state.scheduling.appointments_for_consumer(user.id).await
    };

    Json(appointments)
}

pub async fn appointment_history(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
) -> Json<Value> {
    let appointments = state.scheduling.history_for_consumer(user.id).await;

    Json(json!({
        "appointments": appointments,
        "now": Utc::now(),
    }))
}

pub async fn check_appointment_conflicts(
    State(state): State<AppointmentState>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let slot = SlotQuery::new(
        parse_slot_start(&query.date, &query.time)?,
        query.duration_minutes,
        query.provider_id,
    )?;

    Ok(Json(state.scheduling.check_conflicts(&slot).await))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = find_appointment(&state, appointment_id).await?;

    if !appointment.is_party(user.id) {
        return Err(AppointmentError::Unauthorized.into());
    }

    Ok(Json(appointment))
}

/// Either party may cancel.
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointment = find_appointment(&state, appointment_id).await?;

    if !appointment.is_party(user.id) {
        return Err(AppointmentError::Unauthorized.into());
    }

    state.scheduling.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// PROVIDER LIFECYCLE HANDLERS
// ==============================================================================

pub async fn confirm_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &user, appointment_id, AppointmentStatus::Confirmed).await
}

pub async fn decline_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &user, appointment_id, AppointmentStatus::Declined).await
}

pub async fn complete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    transition(&state, &user, appointment_id, AppointmentStatus::Completed).await
}

async fn transition(
    state: &AppointmentState,
    user: &AuthUser,
    appointment_id: i64,
    target: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    debug!("User {} requests {} on appointment {}", user.id, target, appointment_id);

    if !user.is_provider() {
        return Err(AppError::Forbidden(format!(
            "Only providers can mark appointments {}",
            target
        )));
    }

    let appointment = find_appointment(state, appointment_id).await?;
    state.scheduling.lifecycle().authorize_provider(&appointment, user.id)?;

    let updated = state
        .scheduling
        .update_status(appointment_id, target, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated
    })))
}

async fn find_appointment(
    state: &AppointmentState,
    appointment_id: i64,
) -> Result<Appointment, AppError> {
    state
        .scheduling
        .get_appointment(appointment_id)
        .await
        .ok_or_else(|| AppointmentError::NotFound(appointment_id).into())
}
