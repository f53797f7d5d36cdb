use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::{error::AppError, AppJson};
use shared_utils::{parse_calendar_date, weekday_name};

use crate::models::{CreateDoctorRequest, DoctorError, DoctorListing, DoctorSearchFilters};
use crate::services::{availability::day_of_week, DoctorService};

#[derive(Debug, Deserialize)]
pub struct DaySlotsQuery {
    pub date: Option<String>,
}

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::AlreadyExists(_) => {
                AppError::Conflict("A doctor with this email or license number already exists".to_string())
            }
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(service): State<Arc<DoctorService>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let doctors: Vec<DoctorListing> = service
        .list_doctors(&filters)
        .await?
        .iter()
        .map(|d| d.listing())
        .collect();

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(service): State<Arc<DoctorService>>,
    AppJson(request): AppJson<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = service.create_doctor(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Doctor created successfully",
            "doctor": doctor
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = service.get_doctor(&doctor_id).await?;
    Ok(Json(json!({ "doctor": doctor })))
}

#[axum::debug_handler]
pub async fn get_day_slots(
    State(service): State<Arc<DoctorService>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<DaySlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let raw_date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;
    let date = parse_calendar_date(&raw_date)
        .map_err(|_| AppError::ValidationError("date must be an ISO date".to_string()))?;

    let slots = service.available_slots_for_day(&doctor_id, date).await?;

    Ok(Json(json!({
        "doctorId": doctor_id,
        "date": date,
        "day": weekday_name(day_of_week(date)),
        "availableSlots": slots
    })))
}
