use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, availability_routes};
use chat_cell::router::chat_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;

use crate::state::AppState;

pub fn create_router(state: &AppState) -> Router {
    let doctors = doctor_routes(state.doctors.clone()).merge(availability_routes(state.appointments.clone()));

    Router::new()
        .route("/", get(|| async { "Hospital front desk API is running!" }))
        .nest("/api/patients", patient_routes(state.patients.clone()))
        .nest("/api/doctors", doctors)
        .nest("/api/appointments", appointment_routes(state.appointments.clone()))
        .nest("/api/chat", chat_routes(state.chat.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use shared_config::AppConfig;
    use shared_utils::test_utils::MockSupabaseResponses;
    use tower::ServiceExt;

    async fn app() -> Router {
        let state = AppState::initialize(&AppConfig::default()).await.unwrap();
        create_router(&state)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn liveness() {
        let response = app().await.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_doctor_and_patient_then_book_through_every_router() {
        let app = app().await;

        let doctor = MockSupabaseResponses::doctor_response("D001001", "Sarah", "Johnson", "Cardiology");
        let created = app.clone().oneshot(post("/api/doctors", doctor)).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let patient = app
            .clone()
            .oneshot(post(
                "/api/patients",
                json!({
                    "firstName": "Jane",
                    "lastName": "Doe",
                    "dateOfBirth": "1990-04-12",
                    "gender": "female",
                    "email": "jane@example.com",
                    "phone": "(555) 987-6543",
                    "address": "42 Elm Street"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(patient.status(), StatusCode::CREATED);
        let patient_id = json_body(patient).await["patient"]["patientId"].as_str().unwrap().to_string();

        let available = app
            .clone()
            .oneshot(get("/api/doctors/availability?doctorId=D001001&date=2025-01-06&time=09:00"))
            .await
            .unwrap();
        assert_eq!(available.status(), StatusCode::OK);
        assert_eq!(json_body(available).await["available"], true);

        let booking = json!({
            "patientId": patient_id,
            "doctorId": "D001001",
            "appointmentDate": "2025-01-06",
            "startTime": "09:00",
            "type": "consultation",
            "reason": "Check-up"
        });
        let booked = app.clone().oneshot(post("/api/appointments", booking.clone())).await.unwrap();
        assert_eq!(booked.status(), StatusCode::CREATED);

        let again = app.clone().oneshot(post("/api/appointments", booking)).await.unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);

        let slots = app.oneshot(get("/api/doctors/D001001/slots?date=2025-01-06")).await.unwrap();
        assert_eq!(slots.status(), StatusCode::OK);
        assert_eq!(json_body(slots).await["day"], "Monday");
    }
}
