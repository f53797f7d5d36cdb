use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_utils::SlotTime;

use crate::models::AppointmentError;
use crate::services::store::AppointmentStore;

/// Double-booking check. Two appointments conflict only when they share
/// doctor, date and start time; overlapping intervals with different start
/// times are not detected.
pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn has_conflict(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking conflicts for doctor {} on {} at {}", doctor_id, date, start_time);

        let existing = self.store.find_active_at(doctor_id, date, start_time).await?;

        if let Some(appointment) = &existing {
            warn!(
                "Conflict detected for doctor {}: appointment {} already holds {} {}",
                doctor_id, appointment.appointment_id, date, start_time
            );
        }

        Ok(existing.is_some())
    }
}
