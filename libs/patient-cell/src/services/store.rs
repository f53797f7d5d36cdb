use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::Patient;

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn insert(&self, patient: &Patient) -> Result<Patient, DatabaseError>;

    async fn find_by_id(&self, patient_id: &str) -> Result<Option<Patient>, DatabaseError>;

    /// `email` must already be normalised to lowercase.
    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DatabaseError>;
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

pub struct SupabasePatientStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePatientStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn insert(&self, patient: &Patient) -> Result<Patient, DatabaseError> {
        debug!("Inserting patient {}", patient.patient_id);
        self.supabase.insert("patients", serde_json::to_value(patient)?).await
    }

    async fn find_by_id(&self, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
        let path = format!("/rest/v1/patients?patientId=eq.{}&limit=1", urlencoding::encode(patient_id));
        let patients: Vec<Patient> = self.supabase.select(&path).await?;
        Ok(patients.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DatabaseError> {
        let path = format!("/rest/v1/patients?email=eq.{}&limit=1", urlencoding::encode(email));
        let patients: Vec<Patient> = self.supabase.select(&path).await?;
        Ok(patients.into_iter().next())
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Default)]
pub struct InMemoryPatientStore {
    patients: RwLock<Vec<Patient>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(patients: Vec<Patient>) -> Self {
        Self {
            patients: RwLock::new(patients),
        }
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert(&self, patient: &Patient) -> Result<Patient, DatabaseError> {
        let mut patients = self.patients.write().await;

        if patients
            .iter()
            .any(|p| p.patient_id == patient.patient_id || p.email == patient.email)
        {
            return Err(DatabaseError::UniqueViolation(format!(
                "patient {} collides with an existing id or email",
                patient.patient_id
            )));
        }

        patients.push(patient.clone());
        Ok(patient.clone())
    }

    async fn find_by_id(&self, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
        let patients = self.patients.read().await;
        Ok(patients.iter().find(|p| p.patient_id == patient_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, DatabaseError> {
        let patients = self.patients.read().await;
        Ok(patients.iter().find(|p| p.email == email).cloned())
    }
}
