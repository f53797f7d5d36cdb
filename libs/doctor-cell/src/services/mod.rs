pub mod availability;
pub mod doctor;
pub mod store;

pub use availability::{day_of_week, is_within_recurring_availability, list_available_slots_for_day};
pub use doctor::DoctorService;
pub use store::{DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
