use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers;
use crate::services::AppointmentBookingService;

pub fn appointment_routes(service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .with_state(service)
}

/// Mounted under the doctors prefix next to the doctor routes.
pub fn availability_routes(service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route("/availability", get(handlers::check_availability))
        .with_state(service)
}
