use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{error::AppError, AppJson};
use shared_utils::{parse_calendar_date, SlotTime};

use crate::models::{
    AppointmentError, AppointmentListQuery, AppointmentStatus, AvailabilityCheck, AvailabilityQuery,
    BookAppointmentRequest, UpdateStatusRequest,
};
use crate::services::AppointmentBookingService;

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error {
            AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::DoctorNotFound => AppError::NotFound(message),
            AppointmentError::DoctorNotAvailable => AppError::Unavailable(message),
            AppointmentError::ConflictDetected | AppointmentError::StatusChanged => {
                AppError::Conflict(message)
            }
            AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(message),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    AppJson(request): AppJson<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let command = request.validate()?;
    let appointment = service.book_appointment(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "appointment": appointment.summary() })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.list_appointments(&query).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(&appointment_id).await?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
    AppJson(request): AppJson<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status: AppointmentStatus = request
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("status is required".to_string()))?
        .parse()?;

    let appointment = service.update_status(&appointment_id, status).await?;

    Ok(Json(json!({
        "message": format!("Appointment {} is now {}", appointment.appointment_id, appointment.status),
        "appointment": appointment
    })))
}

// ==============================================================================
// AVAILABILITY HANDLER
// ==============================================================================

#[axum::debug_handler]
pub async fn check_availability(
    State(service): State<Arc<AppointmentBookingService>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityCheck>, AppError> {
    let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    let (Some(doctor_id), Some(date), Some(time)) =
        (present(&query.doctor_id), present(&query.date), present(&query.time))
    else {
        return Err(AppError::BadRequest("doctorId, date, and time are required".to_string()));
    };

    let date = parse_calendar_date(&date)
        .map_err(|_| AppError::ValidationError("date must be an ISO date".to_string()))?;
    let time = SlotTime::parse(&time)
        .map_err(|_| AppError::ValidationError("time must be in HH:MM format".to_string()))?;

    let check = service
        .check_availability(&doctor_id, date, time)
        .await
        .map_err(|e| match e {
            AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(check))
}
