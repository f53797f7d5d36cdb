use std::sync::Arc;
use serde_json::json;

use shared_config::AppConfig;

use crate::time::SlotTime;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub groq_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            groq_api_key: String::new(),
        }
    }
}

impl TestConfig {
    /// Points both the PostgREST and completion clients at a mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            groq_api_key: "test-groq-key".to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            groq_api_key: self.groq_api_key.clone(),
            groq_base_url: format!("{}/openai/v1", self.supabase_url),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// Doctor row with a Monday-to-Friday 09:00-17:00 schedule.
    pub fn doctor_response(doctor_id: &str, first_name: &str, last_name: &str, department: &str) -> serde_json::Value {
        json!({
            "doctorId": doctor_id,
            "firstName": first_name,
            "lastName": last_name,
            "email": format!("{}.{}@hospital.com", first_name.to_lowercase(), last_name.to_lowercase()),
            "phone": "(555) 123-4567",
            "specialization": department,
            "department": department,
            "licenseNumber": format!("MD{}", &doctor_id[1..]),
            "experience": 12,
            "availability": (1..=5).map(|day| json!({
                "dayOfWeek": day,
                "startTime": "09:00",
                "endTime": "17:00",
                "isAvailable": true
            })).collect::<Vec<_>>(),
            "maxPatientsPerDay": 15,
            "isActive": true,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(patient_id: &str, email: &str) -> serde_json::Value {
        json!({
            "patientId": patient_id,
            "firstName": "Test",
            "lastName": "Patient",
            "dateOfBirth": "1990-01-01",
            "gender": "other",
            "email": email,
            "phone": "(555) 000-0000",
            "address": "1 Test Street",
            "symptoms": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        date: &str,
        start_time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "appointmentId": appointment_id,
            "patientId": patient_id,
            "doctorId": doctor_id,
            "appointmentDate": date,
            "startTime": start_time,
            "endTime": SlotTime::parse(start_time)
                .map(|t| t.plus_minutes(30).to_string())
                .unwrap_or_else(|_| start_time.to_string()),
            "type": "consultation",
            "status": status,
            "reason": "Check-up",
            "symptoms": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}
