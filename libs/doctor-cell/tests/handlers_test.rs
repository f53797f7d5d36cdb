use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::handlers::*;
use doctor_cell::models::{AvailabilitySlot, CreateDoctorRequest, DoctorSearchFilters};
use doctor_cell::router::doctor_routes;
use doctor_cell::services::{DoctorService, InMemoryDoctorStore, SupabaseDoctorStore};
use shared_database::SupabaseClient;
use shared_models::{error::AppError, AppJson};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use shared_utils::SlotTime;

fn supabase_service(server: &MockServer) -> Arc<DoctorService> {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let client = Arc::new(SupabaseClient::new(&config).unwrap());
    Arc::new(DoctorService::new(Arc::new(SupabaseDoctorStore::new(client))))
}

fn memory_service() -> Arc<DoctorService> {
    Arc::new(DoctorService::new(Arc::new(InMemoryDoctorStore::new())))
}

fn create_request(email: &str, license: &str) -> CreateDoctorRequest {
    CreateDoctorRequest {
        first_name: Some("Michael".to_string()),
        last_name: Some("Chen".to_string()),
        email: Some(email.to_string()),
        phone: Some("(555) 234-5678".to_string()),
        specialization: Some("Neurology".to_string()),
        department: Some("Neurology".to_string()),
        license_number: Some(license.to_string()),
        experience: Some(8),
        availability: vec![AvailabilitySlot {
            day_of_week: 2,
            start_time: SlotTime::parse("10:00").unwrap(),
            end_time: SlotTime::parse("18:00").unwrap(),
            is_available: true,
        }],
        ..CreateDoctorRequest::default()
    }
}

#[tokio::test]
async fn test_day_slots_for_weekday() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("doctorId", "eq.D001001"))
        .and(query_param("isActive", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response("D001001", "Sarah", "Johnson", "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let result = get_day_slots(
        State(supabase_service(&mock_server)),
        Path("D001001".to_string()),
        Query(DaySlotsQuery { date: Some("2025-01-06".to_string()) }),
    )
    .await;

    let response = result.unwrap().0;
    assert_eq!(response["day"], "Monday");
    assert_eq!(response["availableSlots"][0]["startTime"], "09:00");
    assert_eq!(response["availableSlots"][0]["endTime"], "17:00");
}

#[tokio::test]
async fn test_day_slots_empty_on_weekend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response("D001001", "Sarah", "Johnson", "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let response = get_day_slots(
        State(supabase_service(&mock_server)),
        Path("D001001".to_string()),
        Query(DaySlotsQuery { date: Some("2025-01-11".to_string()) }),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(response["day"], "Saturday");
    assert_eq!(response["availableSlots"], json!([]));
}

#[tokio::test]
async fn test_day_slots_unknown_doctor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_day_slots(
        State(supabase_service(&mock_server)),
        Path("D999999".to_string()),
        Query(DaySlotsQuery { date: Some("2025-01-06".to_string()) }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_department_filter_is_literal_in_both_stores() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("department", r"imatch.^Card\*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let filters = DoctorSearchFilters {
        department: Some("Card*".to_string()),
        ..DoctorSearchFilters::default()
    };

    let remote = list_doctors(State(supabase_service(&mock_server)), Query(filters.clone()))
        .await
        .unwrap()
        .0;
    assert_eq!(remote["total"], 0);

    let cardiologist = serde_json::from_value(MockSupabaseResponses::doctor_response(
        "D001001", "Sarah", "Johnson", "Cardiology",
    ))
    .unwrap();
    let roster = Arc::new(DoctorService::new(Arc::new(InMemoryDoctorStore::with_doctors(vec![
        cardiologist,
    ]))));

    let local = list_doctors(State(roster.clone()), Query(filters)).await.unwrap().0;
    assert_eq!(local["total"], 0);

    let exact = DoctorSearchFilters {
        department: Some("cardiology".to_string()),
        ..DoctorSearchFilters::default()
    };
    let local = list_doctors(State(roster), Query(exact)).await.unwrap().0;
    assert_eq!(local["total"], 1);
}

#[tokio::test]
async fn test_day_slots_requires_date() {
    let result = get_day_slots(
        State(memory_service()),
        Path("D001001".to_string()),
        Query(DaySlotsQuery { date: None }),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_list_doctors_forwards_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("department", "imatch.^Cardiology$"))
        .and(query_param("order", "firstName.asc,lastName.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response("D001001", "Sarah", "Johnson", "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let filters = DoctorSearchFilters {
        department: Some("Cardiology".to_string()),
        ..DoctorSearchFilters::default()
    };

    let response = list_doctors(State(supabase_service(&mock_server)), Query(filters))
        .await
        .unwrap()
        .0;

    assert_eq!(response["total"], 1);
    assert_eq!(response["doctors"][0]["doctorId"], "D001001");
    assert!(response["doctors"][0].get("email").is_none());
}

#[tokio::test]
async fn test_create_doctor_rejects_duplicate_email() {
    let service = memory_service();

    let (status, _) = create_doctor(
        State(service.clone()),
        AppJson(create_request("michael.chen@hospital.com", "MD234567")),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let duplicate = create_doctor(
        State(service),
        AppJson(create_request("Michael.Chen@hospital.com", "MD999999")),
    )
    .await;

    assert_matches!(duplicate, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_create_doctor_rejects_inverted_window() {
    let mut request = create_request("amy.lee@hospital.com", "MD345678");
    request.availability[0].end_time = SlotTime::parse("09:00").unwrap();

    let result = create_doctor(State(memory_service()), AppJson(request)).await;

    assert_matches!(result, Err(AppError::ValidationError(msg)) if msg.contains("before end time"));
}

#[tokio::test]
async fn test_router_lists_sorted_by_name() {
    let service = memory_service();
    for (first, email, license) in [
        ("Zoe", "zoe@hospital.com", "MD1"),
        ("Anna", "anna@hospital.com", "MD2"),
    ] {
        let mut request = create_request(email, license);
        request.first_name = Some(first.to_string());
        service.create_doctor(request).await.unwrap();
    }

    let app = doctor_routes(service);
    let response = app
        .oneshot(Request::builder().uri("/?isActive=true").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["doctors"][0]["firstName"], "Anna");
    assert_eq!(body["doctors"][1]["firstName"], "Zoe");
}

#[tokio::test]
async fn test_find_active_by_name_ignores_title_and_case() {
    let service = memory_service();
    service
        .create_doctor(create_request("michael.chen@hospital.com", "MD234567"))
        .await
        .unwrap();

    for name in ["Dr. michael CHEN", "dr. chen", "DR michael chen", "  dr.Chen "] {
        let found = service.find_active_by_name(name).await.unwrap();
        assert_eq!(found.map(|d| d.last_name), Some("Chen".to_string()), "{name}");
    }
    assert!(service.find_active_by_name("Nobody").await.unwrap().is_none());
    assert!(service.find_active_by_name("dr.").await.unwrap().is_none());
}
