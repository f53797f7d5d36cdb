// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use doctor_cell::models::Doctor;
use doctor_cell::services::{is_within_recurring_availability, list_available_slots_for_day, DoctorStore};
use patient_cell::services::PatientStore;
use shared_utils::{generate_public_id, SlotTime};

use crate::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus, AvailabilityCheck,
    BookingCommand,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::AppointmentStore;

pub struct AppointmentBookingService {
    doctors: Arc<dyn DoctorStore>,
    patients: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(
        doctors: Arc<dyn DoctorStore>,
        patients: Arc<dyn PatientStore>,
        appointments: Arc<dyn AppointmentStore>,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&appointments)),
            lifecycle_service: AppointmentLifecycleService::new(),
            doctors,
            patients,
            appointments,
        }
    }

    async fn active_doctor(&self, doctor_id: &str) -> Result<Doctor, AppointmentError> {
        self.doctors
            .find_active_by_id(doctor_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::DoctorNotFound)
    }

    /// Book a slot. Checks run in a fixed order and stop at the first
    /// failure: active doctor, patient, weekly schedule, double booking.
    /// Nothing is written unless every check passes.
    pub async fn book_appointment(&self, command: BookingCommand) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {} at {}",
            command.patient_id, command.doctor_id, command.appointment_date, command.start_time
        );

        let doctor = self.active_doctor(&command.doctor_id).await?;

        self.patients
            .find_by_id(&command.patient_id)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::PatientNotFound)?;

        if !is_within_recurring_availability(&doctor, command.appointment_date, command.start_time) {
            warn!(
                "Doctor {} is not available on {} at {}",
                doctor.doctor_id, command.appointment_date, command.start_time
            );
            return Err(AppointmentError::DoctorNotAvailable);
        }

        if self
            .conflict_service
            .has_conflict(&doctor.doctor_id, command.appointment_date, command.start_time)
            .await?
        {
            return Err(AppointmentError::ConflictDetected);
        }

        let now = Utc::now();
        let appointment = Appointment {
            appointment_id: generate_public_id('A'),
            patient_id: command.patient_id,
            doctor_id: doctor.doctor_id,
            appointment_date: command.appointment_date,
            start_time: command.start_time,
            end_time: command.end_time,
            appointment_type: command.appointment_type,
            status: AppointmentStatus::Scheduled,
            reason: command.reason,
            symptoms: command.symptoms,
            notes: command.notes,
            doctor_notes: None,
            created_at: now,
            updated_at: now,
        };

        // The store constraint decides races that slipped past the pre-check.
        let created = self.appointments.insert(&appointment).await.map_err(|e| {
            if e.is_unique_violation() {
                warn!("Slot taken concurrently for doctor {}: {}", appointment.doctor_id, e);
            }
            AppointmentError::from(e)
        })?;

        info!(
            "Appointment {} booked successfully with doctor {}",
            created.appointment_id, created.doctor_id
        );

        Ok(created)
    }

    /// Same checks as booking minus the patient, reported as a result
    /// rather than an error. Only a missing doctor is an error.
    pub async fn check_availability(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: SlotTime,
    ) -> Result<AvailabilityCheck, AppointmentError> {
        debug!("Checking availability for doctor {} on {} at {}", doctor_id, date, time);

        let doctor = self.active_doctor(doctor_id).await?;

        let blocked_message = if !is_within_recurring_availability(&doctor, date, time) {
            Some(AppointmentError::DoctorNotAvailable.to_string())
        } else if self.conflict_service.has_conflict(doctor_id, date, time).await? {
            Some(AppointmentError::ConflictDetected.to_string())
        } else {
            None
        };

        Ok(match blocked_message {
            Some(message) => AvailabilityCheck {
                available: false,
                message,
                available_slots: Some(list_available_slots_for_day(&doctor, date)),
                doctor: None,
            },
            None => AvailabilityCheck {
                available: true,
                message: "Time slot is available".to_string(),
                available_slots: None,
                doctor: Some(doctor.summary()),
            },
        })
    }

    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_appointments(
        &self,
        query: &AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments with filters: {:?}", query);
        Ok(self.appointments.list(query).await?)
    }

    /// Move an appointment along its lifecycle. Cancelling or marking
    /// no-show releases the slot for rebooking.
    pub async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        let updated = match self
            .appointments
            .update_status(appointment_id, current.status, new_status)
            .await?
        {
            Some(updated) => updated,
            None => {
                warn!(
                    "Appointment {} left {} before the move to {} was written",
                    appointment_id, current.status, new_status
                );
                return Err(AppointmentError::StatusChanged);
            }
        };

        info!("Appointment {} moved to {}", appointment_id, new_status);
        Ok(updated)
    }
}
