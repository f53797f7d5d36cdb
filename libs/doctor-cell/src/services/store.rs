use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Doctor, DoctorSearchFilters};

/// Persistence seam for doctor profiles.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn insert(&self, doctor: &Doctor) -> Result<Doctor, DatabaseError>;

    async fn find_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError>;

    /// Matches only when the doctor exists and is active.
    async fn find_active_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError>;

    /// Filtered listing ordered by first name, then last name.
    async fn list(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError>;
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

/// Case-insensitive whole-value match; regex metacharacters in the value
/// are matched literally.
fn exact_ignore_case(value: &str) -> String {
    let pattern = format!("^{}$", regex::escape(value));
    format!("imatch.{}", urlencoding::encode(&pattern))
}

pub struct SupabaseDoctorStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl DoctorStore for SupabaseDoctorStore {
    async fn insert(&self, doctor: &Doctor) -> Result<Doctor, DatabaseError> {
        debug!("Inserting doctor {}", doctor.doctor_id);
        self.supabase.insert("doctors", serde_json::to_value(doctor)?).await
    }

    async fn find_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
        let path = format!("/rest/v1/doctors?doctorId=eq.{}&limit=1", urlencoding::encode(doctor_id));
        let doctors: Vec<Doctor> = self.supabase.select(&path).await?;
        Ok(doctors.into_iter().next())
    }

    async fn find_active_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
        let path = format!(
            "/rest/v1/doctors?doctorId=eq.{}&isActive=eq.true&limit=1",
            urlencoding::encode(doctor_id)
        );
        let doctors: Vec<Doctor> = self.supabase.select(&path).await?;
        Ok(doctors.into_iter().next())
    }

    async fn list(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError> {
        let mut query_parts = Vec::new();

        if let Some(department) = &filters.department {
            query_parts.push(format!("department={}", exact_ignore_case(department)));
        }
        if let Some(specialization) = &filters.specialization {
            query_parts.push(format!("specialization={}", exact_ignore_case(specialization)));
        }
        if let Some(is_active) = filters.is_active {
            query_parts.push(format!("isActive=eq.{}", is_active));
        }
        query_parts.push("order=firstName.asc,lastName.asc".to_string());

        let path = format!("/rest/v1/doctors?{}", query_parts.join("&"));
        self.supabase.select(&path).await
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

/// Process-local store used when Supabase is not configured and in tests.
/// Enforces the same uniqueness on id, email and license number as the table.
#[derive(Default)]
pub struct InMemoryDoctorStore {
    doctors: RwLock<Vec<Doctor>>,
}

impl InMemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctors(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors: RwLock::new(doctors),
        }
    }
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn insert(&self, doctor: &Doctor) -> Result<Doctor, DatabaseError> {
        let mut doctors = self.doctors.write().await;

        let duplicate = doctors.iter().any(|d| {
            d.doctor_id == doctor.doctor_id
                || d.email.eq_ignore_ascii_case(&doctor.email)
                || d.license_number == doctor.license_number
        });
        if duplicate {
            return Err(DatabaseError::UniqueViolation(format!(
                "doctor {} collides with an existing id, email or license",
                doctor.doctor_id
            )));
        }

        doctors.push(doctor.clone());
        Ok(doctor.clone())
    }

    async fn find_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.iter().find(|d| d.doctor_id == doctor_id).cloned())
    }

    async fn find_active_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
        Ok(self.find_by_id(doctor_id).await?.filter(|d| d.is_active))
    }

    async fn list(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DatabaseError> {
        let doctors = self.doctors.read().await;
        let mut matched: Vec<Doctor> = doctors.iter().filter(|d| filters.matches(d)).cloned().collect();

        matched.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
        });

        Ok(matched)
    }
}
