use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use appointment_cell::models::{AppointmentError, AppointmentSummary, BookAppointmentRequest};
use doctor_cell::models::DoctorError;
use patient_cell::models::{CreatePatientRequest, PatientError, PatientSummary};

// ==============================================================================
// AGENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "ReceptionAgent")]
    Reception,
    #[serde(rename = "NurseAgent")]
    Nurse,
    #[serde(rename = "BillingAgent")]
    Billing,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Reception => write!(f, "ReceptionAgent"),
            AgentKind::Nurse => write!(f, "NurseAgent"),
            AgentKind::Billing => write!(f, "BillingAgent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionIntent {
    Greeting,
    Appointment,
    DoctorAvailability,
    Intake,
    Faq,
    Billing,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageLevel::Low => write!(f, "LOW"),
            TriageLevel::Medium => write!(f, "MEDIUM"),
            TriageLevel::High => write!(f, "HIGH"),
        }
    }
}

// ==============================================================================
// CONVERSATION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Caller-supplied context. Prior turns are forwarded to the completion
/// model verbatim; nothing is stored server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub previous_messages: Vec<ChatMessage>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub content: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_agent: Option<AgentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            content: content.into(),
            confidence,
            next_agent: None,
            metadata: None,
        }
    }

    /// Suggest which agent the caller should talk to next.
    pub fn suggest(mut self, agent: AgentKind) -> Self {
        self.next_agent = Some(agent);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        let mut map = match self.metadata.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert(key.to_string(), value);
        self.metadata = Some(Value::Object(map));
        self
    }
}

/// What an agent does with a message: answer it, or pass it to a
/// colleague better suited to it.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    Respond(AgentResponse),
    HandOff(AgentKind),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: AgentContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentCapabilities {
    pub reception: Vec<&'static str>,
    pub nurse: Vec<&'static str>,
    pub billing: Vec<&'static str>,
}

// ==============================================================================
// FRONT DESK BOOKING
// ==============================================================================

/// Walk-in booking: the patient's registration details plus the
/// appointment fields. Any `patientId` in the appointment part is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct FrontDeskBookingRequest {
    pub patient: Option<CreatePatientRequest>,
    #[serde(flatten)]
    pub appointment: BookAppointmentRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontDeskBooking {
    pub patient: PatientSummary,
    pub patient_created: bool,
    pub appointment: AppointmentSummary,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}
