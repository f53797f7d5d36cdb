use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use shared_utils::generate_public_id;

use crate::models::{CreateDoctorRequest, DaySlot, Doctor, DoctorError, DoctorSearchFilters};
use crate::services::availability::list_available_slots_for_day;
use crate::services::store::DoctorStore;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
}

fn required(value: Option<String>, field: &str) -> Result<String, DoctorError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DoctorError::ValidationError(format!("{} is required", field))),
    }
}

impl DoctorService {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn DoctorStore> {
        Arc::clone(&self.store)
    }

    /// Create a doctor profile with a validated weekly schedule.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for: {:?}", request.email);

        let first_name = required(request.first_name, "firstName")?;
        let last_name = required(request.last_name, "lastName")?;
        let email = required(request.email, "email")?.to_lowercase();
        let phone = required(request.phone, "phone")?;
        let specialization = required(request.specialization, "specialization")?;
        let department = required(request.department, "department")?;
        let license_number = required(request.license_number, "licenseNumber")?;
        let experience = request
            .experience
            .ok_or_else(|| DoctorError::ValidationError("experience is required".to_string()))?;

        for slot in &request.availability {
            if slot.day_of_week > 6 {
                return Err(DoctorError::ValidationError(
                    "dayOfWeek must be between 0 (Sunday) and 6 (Saturday)".to_string(),
                ));
            }
            if slot.start_time >= slot.end_time {
                return Err(DoctorError::ValidationError(
                    "Start time must be before end time".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let doctor = Doctor {
            doctor_id: request
                .doctor_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| generate_public_id('D')),
            first_name,
            last_name,
            email,
            phone,
            specialization,
            department,
            license_number,
            experience,
            availability: request.availability,
            max_patients_per_day: request.max_patients_per_day.unwrap_or(20),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert(&doctor).await?;
        info!("Doctor {} created in {}", created.doctor_id, created.department);

        Ok(created)
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        self.store
            .find_by_id(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    pub async fn list_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors with filters: {:?}", filters);
        Ok(self.store.list(filters).await?)
    }

    /// Open windows for an active doctor on the weekday of `date`.
    pub async fn available_slots_for_day(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<DaySlot>, DoctorError> {
        debug!("Listing open windows for doctor {} on {}", doctor_id, date);

        let doctor = self
            .store
            .find_active_by_id(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)?;

        Ok(list_available_slots_for_day(&doctor, date))
    }

    /// Case-insensitive lookup of an active doctor by "First Last" or a bare
    /// first or last name. A leading "Dr." is ignored.
    pub async fn find_active_by_name(&self, name: &str) -> Result<Option<Doctor>, DoctorError> {
        let lowered = name.trim().to_lowercase();
        let wanted = lowered
            .strip_prefix("dr.")
            .or_else(|| lowered.strip_prefix("dr "))
            .unwrap_or(&lowered)
            .trim();
        if wanted.is_empty() {
            return Ok(None);
        }

        let doctors = self.store.list(&DoctorSearchFilters::active_only()).await?;

        Ok(doctors.into_iter().find(|d| {
            let first = d.first_name.to_lowercase();
            let last = d.last_name.to_lowercase();
            wanted == format!("{} {}", first, last) || wanted == first || wanted == last
        }))
    }

    pub async fn find_active_in_department(&self, department: &str) -> Result<Vec<Doctor>, DoctorError> {
        let filters = DoctorSearchFilters {
            department: Some(department.to_string()),
            ..DoctorSearchFilters::active_only()
        };
        Ok(self.store.list(&filters).await?)
    }
}
