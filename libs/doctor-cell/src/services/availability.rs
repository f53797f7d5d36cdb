use chrono::{Datelike, NaiveDate};
use tracing::debug;

use shared_utils::SlotTime;

use crate::models::{DaySlot, Doctor};

/// 0 = Sunday through 6 = Saturday, taken from the calendar date alone.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// True when any open recurring window on `date`'s weekday contains `time`.
/// Windows are half-open: a booking may start at the window start but not at
/// its end.
pub fn is_within_recurring_availability(doctor: &Doctor, date: NaiveDate, time: SlotTime) -> bool {
    let dow = day_of_week(date);
    let within = doctor.availability.iter().any(|slot| slot.covers(dow, time));

    debug!(
        "Availability check for doctor {} on {} (day {}) at {}: {}",
        doctor.doctor_id, date, dow, time, within
    );

    within
}

/// Every open window configured for `date`'s weekday, in configuration order.
pub fn list_available_slots_for_day(doctor: &Doctor, date: NaiveDate) -> Vec<DaySlot> {
    let dow = day_of_week(date);

    doctor
        .availability
        .iter()
        .filter(|slot| slot.is_open_on(dow))
        .map(DaySlot::from)
        .collect()
}
