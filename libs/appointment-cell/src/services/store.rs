use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};
use shared_utils::SlotTime;

use crate::models::{Appointment, AppointmentListQuery, AppointmentStatus};

/// Persistence seam for appointments. Implementations must reject a second
/// slot-occupying appointment for the same doctor, date and start time with
/// `DatabaseError::UniqueViolation`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// A scheduled or confirmed appointment starting exactly at `start_time`.
    async fn find_active_at(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
    ) -> Result<Option<Appointment>, DatabaseError>;

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, DatabaseError>;

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError>;

    /// Ordered by appointment date, then start time.
    async fn list(&self, query: &AppointmentListQuery) -> Result<Vec<Appointment>, DatabaseError>;

    /// Compare-and-set: only applies when the stored status is still
    /// `expected`. `None` means no appointment matched both.
    async fn update_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, DatabaseError>;
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

/// Relies on the `appointments_active_slot` partial unique index for
/// double-booking protection; PostgREST reports a violation as HTTP 409.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_active_at(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?doctorId=eq.{}&appointmentDate=eq.{}&startTime=eq.{}&status=in.(scheduled,confirmed)&limit=1",
            urlencoding::encode(doctor_id),
            date,
            urlencoding::encode(&start_time.to_string())
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path).await?;
        Ok(appointments.into_iter().next())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, DatabaseError> {
        debug!("Inserting appointment {}", appointment.appointment_id);
        self.supabase
            .insert("appointments", serde_json::to_value(appointment)?)
            .await
    }

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?appointmentId=eq.{}&limit=1",
            urlencoding::encode(appointment_id)
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path).await?;
        Ok(appointments.into_iter().next())
    }

    async fn list(&self, query: &AppointmentListQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = &query.patient_id {
            query_parts.push(format!("patientId=eq.{}", urlencoding::encode(patient_id)));
        }
        if let Some(doctor_id) = &query.doctor_id {
            query_parts.push(format!("doctorId=eq.{}", urlencoding::encode(doctor_id)));
        }
        query_parts.push("order=appointmentDate.asc,startTime.asc".to_string());

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        self.supabase.select(&path).await
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?appointmentId=eq.{}&status=eq.{}",
            urlencoding::encode(appointment_id),
            expected
        );
        let changes = json!({
            "status": status,
            "updatedAt": Utc::now(),
        });

        let updated: Vec<Appointment> = self.supabase.update(&path, changes).await?;
        Ok(updated.into_iter().next())
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

/// The uniqueness check and the insert happen under one lock, which gives
/// the same guarantee as the partial unique index.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_active_slot(existing: &Appointment, doctor_id: &str, date: NaiveDate, start_time: SlotTime) -> bool {
    existing.status.occupies_slot()
        && existing.doctor_id == doctor_id
        && existing.appointment_date == date
        && existing.start_time == start_time
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_active_at(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .iter()
            .find(|a| same_active_slot(a, doctor_id, date, start_time))
            .cloned())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, DatabaseError> {
        let mut appointments = self.appointments.lock().await;

        if appointments.iter().any(|a| a.appointment_id == appointment.appointment_id) {
            return Err(DatabaseError::UniqueViolation(format!(
                "appointment id {} already exists",
                appointment.appointment_id
            )));
        }

        if appointment.status.occupies_slot()
            && appointments.iter().any(|a| {
                same_active_slot(a, &appointment.doctor_id, appointment.appointment_date, appointment.start_time)
            })
        {
            return Err(DatabaseError::UniqueViolation(format!(
                "doctor {} already booked on {} at {}",
                appointment.doctor_id, appointment.appointment_date, appointment.start_time
            )));
        }

        appointments.push(appointment.clone());
        Ok(appointment.clone())
    }

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments.iter().find(|a| a.appointment_id == appointment_id).cloned())
    }

    async fn list(&self, query: &AppointmentListQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.appointments.lock().await;
        let mut matched: Vec<Appointment> = appointments.iter().filter(|a| query.matches(a)).cloned().collect();

        matched.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });

        Ok(matched)
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let mut appointments = self.appointments.lock().await;

        Ok(appointments
            .iter_mut()
            .find(|a| a.appointment_id == appointment_id && a.status == expected)
            .map(|a| {
                a.status = status;
                a.updated_at = Utc::now();
                a.clone()
            }))
    }
}
