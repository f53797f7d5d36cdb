// libs/chat-cell/src/services/intent.rs
use crate::models::{AgentKind, ReceptionIntent, TriageLevel};

const BILLING_KEYWORDS: &[&str] = &[
    "bill", "billing", "payment", "cost", "price", "insurance", "coverage", "copay", "deductible",
    "financial", "payment plan", "charge",
];

const MEDICAL_KEYWORDS: &[&str] = &[
    "pain", "hurt", "ache", "symptom", "feeling", "sick", "ill", "fever", "headache", "nausea",
    "dizzy", "tired", "weak", "swelling", "bleeding", "rash", "cough", "sore throat", "emergency",
    "urgent", "critical",
];

const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency", "urgent", "critical", "chest pain", "heart attack", "stroke", "bleeding",
    "unconscious", "not breathing", "severe pain", "accident", "trauma", "911", "ambulance",
];

const GREETING_KEYWORDS: &[&str] = &[
    "hi", "hello", "hey", "greetings", "good morning", "good afternoon", "good evening",
];

const RECEPTION_APPOINTMENT_KEYWORDS: &[&str] = &[
    "appointment", "book", "schedule", "reschedule", "cancel", "change", "available time", "slot",
    "booking", "reservation",
];

const DOCTOR_AVAILABILITY_KEYWORDS: &[&str] = &[
    "doctor available", "doctors available", "available doctor", "available doctors", "when is",
    "availability", "working hours", "next available", "open slots", "who is", "which doctor",
    "which doctors", "what doctors",
];

const FAQ_KEYWORDS: &[&str] = &[
    "visiting hours", "open", "close", "hours", "location", "address", "phone number", "phone",
    "contact", "parking", "visitor", "policy",
];

const INTAKE_KEYWORDS: &[&str] = &["first time", "new patient", "register", "registration"];

pub const DEPARTMENTS: &[&str] = &[
    "emergency", "cardiology", "neurology", "orthopedics", "pediatrics", "obstetrics",
    "general medicine",
];

/// Whole-word (or whole-phrase) match on a lowercased message. A trailing
/// plural "s" still matches, so "bills" hits "bill" but "which" misses "hi".
pub fn contains_keyword(message: &str, keyword: &str) -> bool {
    let bytes = message.as_bytes();

    message.match_indices(keyword).any(|(start, matched)| {
        let end = start + matched.len();
        let boundary_before = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let boundary_after = match bytes.get(end) {
            None => true,
            Some(b's') => bytes.get(end + 1).map_or(true, |b| !b.is_ascii_alphanumeric()),
            Some(b) => !b.is_ascii_alphanumeric(),
        };
        boundary_before && boundary_after
    })
}

pub fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| contains_keyword(message, keyword))
}

/// Pick the agent for a message. Billing wins over medical; everything
/// else, including appointment and general questions, goes to reception.
pub fn route_message(message: &str) -> AgentKind {
    let lower = message.to_lowercase();

    if contains_any(&lower, BILLING_KEYWORDS) {
        AgentKind::Billing
    } else if contains_any(&lower, MEDICAL_KEYWORDS) {
        AgentKind::Nurse
    } else {
        AgentKind::Reception
    }
}

pub fn is_emergency(message: &str) -> bool {
    contains_any(&message.to_lowercase(), EMERGENCY_KEYWORDS)
}

pub fn mentions_doctor_name(message: &str) -> bool {
    let lower = message.to_lowercase();
    contains_keyword(&lower, "dr") || lower.contains("dr.")
}

pub fn mentioned_department(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    DEPARTMENTS.iter().copied().find(|dept| contains_keyword(&lower, dept))
}

/// Greetings only count when nothing more specific was asked.
pub fn classify_reception(message: &str) -> ReceptionIntent {
    let lower = message.to_lowercase();

    if mentions_doctor_name(&lower) || contains_any(&lower, DOCTOR_AVAILABILITY_KEYWORDS) {
        ReceptionIntent::DoctorAvailability
    } else if contains_any(&lower, RECEPTION_APPOINTMENT_KEYWORDS) {
        ReceptionIntent::Appointment
    } else if contains_any(&lower, INTAKE_KEYWORDS) {
        ReceptionIntent::Intake
    } else if contains_any(&lower, FAQ_KEYWORDS) {
        ReceptionIntent::Faq
    } else if contains_any(&lower, BILLING_KEYWORDS) {
        ReceptionIntent::Billing
    } else if contains_any(&lower, GREETING_KEYWORDS) {
        ReceptionIntent::Greeting
    } else {
        ReceptionIntent::Unknown
    }
}

/// Outcome of a keyword triage: level, recommended department and the
/// advice shown to the patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageAssessment {
    pub level: TriageLevel,
    pub department: &'static str,
    pub urgency: &'static str,
}

pub fn assess_triage(message: &str) -> TriageAssessment {
    let lower = message.to_lowercase();
    let any = |words: &[&str]| contains_any(&lower, words);

    if any(&["chest", "heart"]) {
        TriageAssessment {
            level: TriageLevel::High,
            department: "Cardiology",
            urgency: "This requires prompt evaluation. Please schedule within 24 hours.",
        }
    } else if any(&["head", "brain", "neurological"]) {
        TriageAssessment {
            level: TriageLevel::High,
            department: "Neurology",
            urgency: "This requires prompt evaluation. Please schedule within 24 hours.",
        }
    } else if any(&["bone", "joint", "fracture"]) {
        TriageAssessment {
            level: TriageLevel::Medium,
            department: "Orthopedics",
            urgency: "This should be evaluated within 48 hours.",
        }
    } else if any(&["child", "pediatric", "kid"]) {
        TriageAssessment {
            level: TriageLevel::Medium,
            department: "Pediatrics",
            urgency: "Children should be evaluated promptly. Please schedule within 24-48 hours.",
        }
    } else {
        TriageAssessment {
            level: TriageLevel::Low,
            department: "General Medicine",
            urgency: "You can schedule a regular appointment.",
        }
    }
}
