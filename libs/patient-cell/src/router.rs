use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::PatientService;

pub fn patient_routes(service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient).get(handlers::lookup_patient))
        .with_state(service)
}
