use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_utils::{generate_public_id, parse_calendar_date};

use crate::models::{CreatePatientRequest, Gender, Patient, PatientError};
use crate::services::store::PatientStore;

pub struct PatientService {
    store: Arc<dyn PatientStore>,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, PatientError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PatientError::ValidationError(format!("{} is required", field))),
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn PatientStore> {
        Arc::clone(&self.store)
    }

    /// Register a new patient. Email is the natural key.
    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let patient = self.build_patient(request)?;
        debug!("Registering patient with email: {}", patient.email);

        if self.store.find_by_email(&patient.email).await?.is_some() {
            return Err(PatientError::AlreadyExists);
        }

        let created = self.store.insert(&patient).await?;
        info!("Patient {} registered", created.patient_id);

        Ok(created)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Patient, PatientError> {
        let email = normalize_email(email);
        debug!("Looking up patient by email: {}", email);

        self.store
            .find_by_email(&email)
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        self.store
            .find_by_id(patient_id)
            .await?
            .ok_or(PatientError::NotFound)
    }

    /// Reuse the patient registered under the request's email, or register a
    /// new one. The flag is true when a record was created.
    pub async fn find_or_register(
        &self,
        request: CreatePatientRequest,
    ) -> Result<(Patient, bool), PatientError> {
        let email = normalize_email(required(&request.email, "email")?);

        if let Some(existing) = self.store.find_by_email(&email).await? {
            debug!("Reusing patient {} for {}", existing.patient_id, email);
            return Ok((existing, false));
        }

        match self.create_patient(request).await {
            Ok(patient) => Ok((patient, true)),
            // Lost a registration race for the same email.
            Err(PatientError::AlreadyExists) => Ok((self.get_by_email(&email).await?, false)),
            Err(e) => Err(e),
        }
    }

    fn build_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let first_name = required(&request.first_name, "firstName")?.to_string();
        let last_name = required(&request.last_name, "lastName")?.to_string();
        let date_of_birth = required(&request.date_of_birth, "dateOfBirth")?;
        let gender = required(&request.gender, "gender")?;
        let email = normalize_email(required(&request.email, "email")?);
        let phone = required(&request.phone, "phone")?.to_string();
        let address = required(&request.address, "address")?.to_string();

        let date_of_birth = parse_calendar_date(date_of_birth)
            .map_err(|_| PatientError::ValidationError("dateOfBirth must be an ISO date".to_string()))?;
        let gender: Gender = gender.parse()?;

        let now = Utc::now();
        Ok(Patient {
            patient_id: generate_public_id('P'),
            first_name,
            last_name,
            date_of_birth,
            gender,
            email,
            phone,
            address,
            symptoms: request.symptoms.unwrap_or_default(),
            assigned_department: request
                .assigned_department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: now,
            updated_at: now,
        })
    }
}
