use std::sync::Arc;

use tracing::info;

use appointment_cell::services::AppointmentBookingService;
use patient_cell::services::PatientService;

use crate::models::{ChatError, FrontDeskBooking, FrontDeskBookingRequest};

/// Walk-in desk: find or register the patient, then book the slot.
pub struct FrontDeskService {
    patients: Arc<PatientService>,
    booking: Arc<AppointmentBookingService>,
}

impl FrontDeskService {
    pub fn new(patients: Arc<PatientService>, booking: Arc<AppointmentBookingService>) -> Self {
        Self { patients, booking }
    }

    /// Appointment fields are validated before anything is read or written.
    /// A newly registered patient stays registered when the slot is refused.
    pub async fn book(&self, request: FrontDeskBookingRequest) -> Result<FrontDeskBooking, ChatError> {
        let patient_request = request
            .patient
            .ok_or_else(|| ChatError::ValidationError("patient is required".to_string()))?;
        let mut command = request.appointment.validate_for_patient("")?;

        let (patient, patient_created) = self.patients.find_or_register(patient_request).await?;
        command.patient_id = patient.patient_id.clone();

        let appointment = self.booking.book_appointment(command).await?;
        info!(
            "Front desk booked {} for patient {} (new registration: {})",
            appointment.appointment_id, patient.patient_id, patient_created
        );

        Ok(FrontDeskBooking {
            patient: patient.summary(),
            patient_created,
            appointment: appointment.summary(),
        })
    }
}
