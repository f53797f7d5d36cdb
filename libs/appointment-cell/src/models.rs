// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::{DaySlot, DoctorSummary};
use shared_database::DatabaseError;
use shared_utils::{parse_calendar_date, SlotTime};

/// Minutes added to the start time when no usable end time is supplied.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 30;

// ==============================================================================
// STATUS AND TYPE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Scheduled and confirmed appointments hold their slot.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in-progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no-show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in-progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no-show" => Ok(AppointmentStatus::NoShow),
            _ => Err(AppointmentError::ValidationError(
                "status must be one of scheduled, confirmed, in-progress, completed, cancelled, no-show"
                    .to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Emergency,
    Routine,
    Specialist,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Consultation => write!(f, "consultation"),
            AppointmentType::FollowUp => write!(f, "follow-up"),
            AppointmentType::Emergency => write!(f, "emergency"),
            AppointmentType::Routine => write!(f, "routine"),
            AppointmentType::Specialist => write!(f, "specialist"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consultation" => Ok(AppointmentType::Consultation),
            "follow-up" => Ok(AppointmentType::FollowUp),
            "emergency" => Ok(AppointmentType::Emergency),
            "routine" => Ok(AppointmentType::Routine),
            "specialist" => Ok(AppointmentType::Specialist),
            _ => Err(AppointmentError::ValidationError(
                "type must be one of consultation, follow-up, emergency, routine, specialist".to_string(),
            )),
        }
    }
}

// ==============================================================================
// CORE APPOINTMENT MODEL
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn summary(&self) -> AppointmentSummary {
        AppointmentSummary {
            appointment_id: self.appointment_id.clone(),
            patient_id: self.patient_id.clone(),
            doctor_id: self.doctor_id.clone(),
            appointment_date: self.appointment_date,
            start_time: self.start_time,
            end_time: self.end_time,
            appointment_type: self.appointment_type,
            status: self.status,
            reason: self.reason.clone(),
        }
    }
}

/// The fields echoed back after a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: String,
}

// ==============================================================================
// BOOKING REQUEST
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
    pub reason: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCommand {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppointmentError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppointmentError::ValidationError(format!("{} is required", field))),
    }
}

impl BookAppointmentRequest {
    /// Checks presence in the order patientId, doctorId, appointmentDate,
    /// startTime, type, reason, then parses each value. An absent or
    /// malformed endTime falls back to start + 30 minutes.
    pub fn validate(&self) -> Result<BookingCommand, AppointmentError> {
        let patient_id = required(&self.patient_id, "patientId")?;
        self.validate_for_patient(patient_id)
    }

    /// Same checks as [`validate`](Self::validate) with the patient supplied
    /// by the caller, for flows that resolve the patient themselves.
    pub fn validate_for_patient(&self, patient_id: &str) -> Result<BookingCommand, AppointmentError> {
        let doctor_id = required(&self.doctor_id, "doctorId")?;
        let appointment_date = required(&self.appointment_date, "appointmentDate")?;
        let start_time = required(&self.start_time, "startTime")?;
        let appointment_type = required(&self.appointment_type, "type")?;
        let reason = required(&self.reason, "reason")?;

        let appointment_date = parse_calendar_date(appointment_date)
            .map_err(|_| AppointmentError::ValidationError("appointmentDate must be an ISO date".to_string()))?;
        let start_time = SlotTime::parse(start_time)
            .map_err(|_| AppointmentError::ValidationError("startTime must be in HH:MM format".to_string()))?;
        let appointment_type: AppointmentType = appointment_type.parse()?;

        let end_time = self
            .end_time
            .as_deref()
            .and_then(|raw| SlotTime::parse(raw).ok())
            .unwrap_or_else(|| start_time.plus_minutes(DEFAULT_APPOINTMENT_MINUTES));

        Ok(BookingCommand {
            patient_id: patient_id.to_string(),
            doctor_id: doctor_id.to_string(),
            appointment_date,
            start_time,
            end_time,
            appointment_type,
            reason: reason.to_string(),
            symptoms: self
                .symptoms
                .iter()
                .flatten()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }
}

// ==============================================================================
// QUERY AND RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Answer of the availability endpoint. Alternatives are listed only when
/// the requested time cannot be booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheck {
    pub available: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_slots: Option<Vec<DaySlot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListQuery {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

impl AppointmentListQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.as_ref().map_or(true, |id| &appointment.patient_id == id)
            && self.doctor_id.as_ref().map_or(true, |id| &appointment.doctor_id == id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found or not available")]
    DoctorNotFound,

    #[error("Doctor is not available at the requested time")]
    DoctorNotAvailable,

    #[error("This time slot is already booked")]
    ConflictDetected,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment status was changed by another request")]
    StatusChanged,

    #[error("{0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for AppointmentError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(_) => AppointmentError::ConflictDetected,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}
