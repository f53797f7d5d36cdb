use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::{error::AppError, AppJson};

use crate::models::{CreatePatientRequest, PatientError, PatientLookupQuery};
use crate::services::PatientService;

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        match error {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::AlreadyExists => AppError::Conflict(PatientError::AlreadyExists.to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(service): State<Arc<PatientService>>,
    AppJson(request): AppJson<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = service.create_patient(request).await?;
    let mut summary = patient.summary();
    summary.assigned_department = None;

    Ok((StatusCode::CREATED, Json(json!({ "patient": summary }))))
}

#[axum::debug_handler]
pub async fn lookup_patient(
    State(service): State<Arc<PatientService>>,
    Query(query): Query<PatientLookupQuery>,
) -> Result<Json<Value>, AppError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Email parameter is required".to_string()))?;

    let patient = service.get_by_email(&email).await?;

    Ok(Json(json!({ "patient": patient.summary() })))
}
