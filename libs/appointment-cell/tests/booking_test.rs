use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus, AppointmentType, BookingCommand,
};
use appointment_cell::services::{AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore};
use doctor_cell::models::Doctor;
use doctor_cell::services::InMemoryDoctorStore;
use patient_cell::models::Patient;
use patient_cell::services::InMemoryPatientStore;
use shared_database::DatabaseError;
use shared_utils::test_utils::MockSupabaseResponses;
use shared_utils::SlotTime;

const MONDAY: &str = "2025-01-06";
const TUESDAY: &str = "2025-01-07";

fn doctor(doctor_id: &str, active: bool) -> Doctor {
    let mut row = MockSupabaseResponses::doctor_response(doctor_id, "Sarah", "Johnson", "Cardiology");
    row["isActive"] = active.into();
    serde_json::from_value(row).unwrap()
}

fn patient(patient_id: &str) -> Patient {
    serde_json::from_value(MockSupabaseResponses::patient_response(patient_id, "test@example.com")).unwrap()
}

fn service_with_store(appointments: Arc<dyn AppointmentStore>) -> AppointmentBookingService {
    let doctors = InMemoryDoctorStore::with_doctors(vec![doctor("D001001", true), doctor("D002002", false)]);
    let patients = InMemoryPatientStore::with_patients(vec![patient("P000001AAA")]);
    AppointmentBookingService::new(Arc::new(doctors), Arc::new(patients), appointments)
}

fn service() -> AppointmentBookingService {
    service_with_store(Arc::new(InMemoryAppointmentStore::new()))
}

fn command(doctor_id: &str, date: &str, time: &str) -> BookingCommand {
    let start_time = SlotTime::parse(time).unwrap();
    BookingCommand {
        patient_id: "P000001AAA".to_string(),
        doctor_id: doctor_id.to_string(),
        appointment_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        start_time,
        end_time: start_time.plus_minutes(30),
        appointment_type: AppointmentType::Consultation,
        reason: "Chest pain".to_string(),
        symptoms: Vec::new(),
        notes: None,
    }
}

#[tokio::test]
async fn test_monday_schedule_walkthrough() {
    let service = service();

    let booked = service.book_appointment(command("D001001", MONDAY, "09:00")).await.unwrap();
    assert_eq!(booked.end_time.to_string(), "09:30");
    assert_eq!(booked.status, AppointmentStatus::Scheduled);
    assert!(booked.appointment_id.starts_with('A'));

    assert_matches!(
        service.book_appointment(command("D001001", MONDAY, "09:00")).await,
        Err(AppointmentError::ConflictDetected)
    );
    assert_matches!(
        service.book_appointment(command("D001001", MONDAY, "17:00")).await,
        Err(AppointmentError::DoctorNotAvailable)
    );
    assert_matches!(
        service.book_appointment(command("D001001", TUESDAY, "09:00")).await,
        Ok(_)
    );
}

#[tokio::test]
async fn test_weekend_is_unavailable_at_any_time() {
    let service = service();
    for time in ["00:00", "09:00", "12:30", "23:59"] {
        assert_matches!(
            service.book_appointment(command("D001001", "2025-01-11", time)).await,
            Err(AppointmentError::DoctorNotAvailable)
        );
    }
}

#[tokio::test]
async fn test_inactive_or_unknown_doctor_is_not_found() {
    let service = service();
    assert_matches!(
        service.book_appointment(command("D002002", MONDAY, "10:00")).await,
        Err(AppointmentError::DoctorNotFound)
    );
    assert_matches!(
        service.book_appointment(command("D999999", MONDAY, "10:00")).await,
        Err(AppointmentError::DoctorNotFound)
    );
}

#[tokio::test]
async fn test_doctor_is_checked_before_patient() {
    let service = service();
    let mut unknown_everyone = command("D999999", MONDAY, "10:00");
    unknown_everyone.patient_id = "P999999ZZZ".to_string();
    assert_matches!(
        service.book_appointment(unknown_everyone).await,
        Err(AppointmentError::DoctorNotFound)
    );

    let mut unknown_patient = command("D001001", MONDAY, "10:00");
    unknown_patient.patient_id = "P999999ZZZ".to_string();
    assert_matches!(
        service.book_appointment(unknown_patient).await,
        Err(AppointmentError::PatientNotFound)
    );
}

#[tokio::test]
async fn test_failed_checks_write_nothing() {
    let service = service();
    let _ = service.book_appointment(command("D001001", MONDAY, "08:00")).await;
    let _ = service.book_appointment(command("D002002", MONDAY, "10:00")).await;

    let all = service.list_appointments(&AppointmentListQuery::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_cancel_frees_the_slot() {
    let service = service();
    let first = service.book_appointment(command("D001001", MONDAY, "10:00")).await.unwrap();

    service
        .update_status(&first.appointment_id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let rebooked = service.book_appointment(command("D001001", MONDAY, "10:00")).await.unwrap();
    assert_ne!(rebooked.appointment_id, first.appointment_id);
}

#[tokio::test]
async fn test_confirmed_appointment_still_blocks() {
    let service = service();
    let first = service.book_appointment(command("D001001", MONDAY, "11:00")).await.unwrap();
    service
        .update_status(&first.appointment_id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    assert_matches!(
        service.book_appointment(command("D001001", MONDAY, "11:00")).await,
        Err(AppointmentError::ConflictDetected)
    );
}

#[tokio::test]
async fn test_overlapping_start_times_are_not_detected() {
    // Only identical start times conflict; 09:15 sits inside 09:00-09:30.
    let service = service();
    service.book_appointment(command("D001001", MONDAY, "09:00")).await.unwrap();

    let overlapping = service.book_appointment(command("D001001", MONDAY, "09:15")).await;
    assert!(overlapping.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_exactly_one_wins() {
    let service = Arc::new(service());

    let attempts = (0..8).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.book_appointment(command("D001001", MONDAY, "14:00")).await })
    });

    let results: Vec<Result<Appointment, AppointmentError>> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppointmentError::ConflictDetected)));
}

/// Hides existing bookings from the pre-check so only the insert constraint
/// can stop a duplicate.
struct StalePrecheckStore {
    inner: InMemoryAppointmentStore,
}

#[async_trait]
impl AppointmentStore for StalePrecheckStore {
    async fn find_active_at(
        &self,
        _doctor_id: &str,
        _date: NaiveDate,
        _start_time: SlotTime,
    ) -> Result<Option<Appointment>, DatabaseError> {
        Ok(None)
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, DatabaseError> {
        self.inner.insert(appointment).await
    }

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError> {
        self.inner.find_by_id(appointment_id).await
    }

    async fn list(&self, query: &AppointmentListQuery) -> Result<Vec<Appointment>, DatabaseError> {
        self.inner.list(query).await
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, DatabaseError> {
        self.inner.update_status(appointment_id, expected, status).await
    }
}

#[tokio::test]
async fn test_store_constraint_reports_conflict() {
    let service = service_with_store(Arc::new(StalePrecheckStore {
        inner: InMemoryAppointmentStore::new(),
    }));

    service.book_appointment(command("D001001", MONDAY, "15:00")).await.unwrap();

    assert_matches!(
        service.book_appointment(command("D001001", MONDAY, "15:00")).await,
        Err(AppointmentError::ConflictDetected)
    );
}

#[tokio::test]
async fn test_check_availability_reports_reason_and_alternatives() {
    let service = service();
    let monday = NaiveDate::parse_from_str(MONDAY, "%Y-%m-%d").unwrap();

    let open = service
        .check_availability("D001001", monday, SlotTime::parse("10:00").unwrap())
        .await
        .unwrap();
    assert!(open.available);
    assert_eq!(open.doctor.unwrap().doctor_id, "D001001");

    let closed = service
        .check_availability("D001001", monday, SlotTime::parse("17:00").unwrap())
        .await
        .unwrap();
    assert!(!closed.available);
    assert_eq!(closed.message, "Doctor is not available at the requested time");
    let slots = closed.available_slots.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].day, "Monday");

    service.book_appointment(command("D001001", MONDAY, "10:00")).await.unwrap();
    let taken = service
        .check_availability("D001001", monday, SlotTime::parse("10:00").unwrap())
        .await
        .unwrap();
    assert!(!taken.available);
    assert_eq!(taken.message, "This time slot is already booked");

    assert_matches!(
        service
            .check_availability("D002002", monday, SlotTime::parse("10:00").unwrap())
            .await,
        Err(AppointmentError::DoctorNotFound)
    );
}

#[tokio::test]
async fn test_listing_is_ordered_by_date_then_time() {
    let service = service();
    service.book_appointment(command("D001001", TUESDAY, "09:00")).await.unwrap();
    service.book_appointment(command("D001001", MONDAY, "16:00")).await.unwrap();
    service.book_appointment(command("D001001", MONDAY, "9:30")).await.unwrap();

    let listed = service
        .list_appointments(&AppointmentListQuery {
            doctor_id: Some("D001001".to_string()),
            ..AppointmentListQuery::default()
        })
        .await
        .unwrap();

    let order: Vec<String> = listed
        .iter()
        .map(|a| format!("{} {}", a.appointment_date, a.start_time))
        .collect();
    assert_eq!(order, vec!["2025-01-06 09:30", "2025-01-06 16:00", "2025-01-07 09:00"]);
}

#[tokio::test]
async fn test_terminal_status_rejects_further_changes() {
    let service = service();
    let booked = service.book_appointment(command("D001001", MONDAY, "12:00")).await.unwrap();
    service
        .update_status(&booked.appointment_id, AppointmentStatus::NoShow)
        .await
        .unwrap();

    assert_matches!(
        service.update_status(&booked.appointment_id, AppointmentStatus::Confirmed).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        service.update_status("A000000NONE", AppointmentStatus::Confirmed).await,
        Err(AppointmentError::NotFound)
    );
}

/// Yields after every read so two status changes interleave between their
/// read and their write.
struct InterleavingStore {
    inner: InMemoryAppointmentStore,
}

#[async_trait]
impl AppointmentStore for InterleavingStore {
    async fn find_active_at(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
    ) -> Result<Option<Appointment>, DatabaseError> {
        self.inner.find_active_at(doctor_id, date, start_time).await
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, DatabaseError> {
        self.inner.insert(appointment).await
    }

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let found = self.inner.find_by_id(appointment_id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn list(&self, query: &AppointmentListQuery) -> Result<Vec<Appointment>, DatabaseError> {
        self.inner.list(query).await
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, DatabaseError> {
        self.inner.update_status(appointment_id, expected, status).await
    }
}

#[tokio::test]
async fn test_racing_status_changes_cannot_both_apply() {
    let service = service_with_store(Arc::new(InterleavingStore {
        inner: InMemoryAppointmentStore::new(),
    }));
    let booked = service.book_appointment(command("D001001", MONDAY, "13:00")).await.unwrap();

    let (confirm, cancel) = tokio::join!(
        service.update_status(&booked.appointment_id, AppointmentStatus::Confirmed),
        service.update_status(&booked.appointment_id, AppointmentStatus::Cancelled),
    );

    let (winner, loser) = match (confirm, cancel) {
        (Ok(winner), loser) | (loser, Ok(winner)) => (winner, loser),
        (Err(a), Err(b)) => panic!("both status changes failed: {a}, {b}"),
    };
    assert_matches!(loser, Err(AppointmentError::StatusChanged));

    let stored = service.get_appointment(&booked.appointment_id).await.unwrap();
    assert_eq!(stored.status, winner.status);

    // Retrying is validated against whatever status won.
    let retry = service
        .update_status(&booked.appointment_id, AppointmentStatus::Cancelled)
        .await;
    match winner.status {
        AppointmentStatus::Confirmed => assert_eq!(retry.unwrap().status, AppointmentStatus::Cancelled),
        _ => assert_matches!(retry, Err(AppointmentError::InvalidStatusTransition { .. })),
    }
}
