// libs/doctor-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_utils::{weekday_name, SlotTime};

fn default_true() -> bool {
    true
}

fn default_max_patients() -> u32 {
    20
}

// ==============================================================================
// CORE DOCTOR MODELS
// ==============================================================================

/// One recurring weekly window. `start_time` is inclusive, `end_time` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day_of_week: u8, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl AvailabilitySlot {
    pub fn is_open_on(&self, day_of_week: u8) -> bool {
        self.day_of_week == day_of_week && self.is_available
    }

    pub fn covers(&self, day_of_week: u8, time: SlotTime) -> bool {
        self.is_open_on(day_of_week) && self.start_time <= time && self.end_time > time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub doctor_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub department: String,
    pub license_number: String,
    pub experience: u32,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default = "default_max_patients")]
    pub max_patients_per_day: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn listing(&self) -> DoctorListing {
        DoctorListing {
            doctor_id: self.doctor_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            specialization: self.specialization.clone(),
            department: self.department.clone(),
            experience: self.experience,
            availability: self.availability.clone(),
            is_active: self.is_active,
        }
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            doctor_id: self.doctor_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            specialization: self.specialization.clone(),
            department: self.department.clone(),
        }
    }
}

// ==============================================================================
// RESPONSE DTOs
// ==============================================================================

/// Public projection used by the doctor listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListing {
    pub doctor_id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub department: String,
    pub experience: u32,
    pub availability: Vec<AvailabilitySlot>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub doctor_id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub department: String,
}

/// An open window on a concrete day, offered as an alternative time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    pub day: String,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
}

impl From<&AvailabilitySlot> for DaySlot {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self {
            day: weekday_name(slot.day_of_week).to_string(),
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSearchFilters {
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub is_active: Option<bool>,
}

impl DoctorSearchFilters {
    pub fn active_only() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, doctor: &Doctor) -> bool {
        let department_ok = self
            .department
            .as_ref()
            .map_or(true, |d| doctor.department.eq_ignore_ascii_case(d));
        let specialization_ok = self
            .specialization
            .as_ref()
            .map_or(true, |s| doctor.specialization.eq_ignore_ascii_case(s));
        let active_ok = self.is_active.map_or(true, |active| doctor.is_active == active);

        department_ok && specialization_ok && active_ok
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub doctor_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub department: Option<String>,
    pub license_number: Option<String>,
    pub experience: Option<u32>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    pub max_patients_per_day: Option<u32>,
    pub is_active: Option<bool>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for DoctorError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(msg) => DoctorError::AlreadyExists(msg),
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}
