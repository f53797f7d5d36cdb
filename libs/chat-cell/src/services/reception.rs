use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, error};

use doctor_cell::models::{Doctor, DoctorSearchFilters};
use doctor_cell::services::DoctorService;
use shared_utils::weekday_name;

use crate::models::{AgentContext, AgentKind, AgentReply, ChatError, ReceptionIntent};
use crate::services::agent::{canned, escalate_if_emergency, Agent, FreeTextResponder};
use crate::services::completion::CompletionClient;
use crate::services::intent::{classify_reception, contains_any, contains_keyword, mentioned_department};

const SYSTEM_PROMPT: &str = "You are a professional hospital reception assistant. Help patients book, reschedule, or cancel appointments, provide information about visiting hours, insurance, and billing, answer general questions about hospital services and direct patients to the appropriate department.

Guidelines:
- Be polite, professional and empathetic.
- Never provide medical advice or diagnosis.
- For emergencies, tell the patient to call 911 and escalate to human staff.
- Only give doctor information that was provided to you. Do not invent doctor names or details.
- If a question is unrelated to hospital services, say: \"I can only help with hospital-related questions.\"

Departments: Emergency, Cardiology, Neurology, Orthopedics, Pediatrics, Obstetrics, General Medicine, Radiology, Laboratory, Pharmacy.
Visiting hours: Monday - Friday 8:00 AM - 8:00 PM, Saturday - Sunday 8:00 AM - 6:00 PM. Emergency services: 24/7.";

const GREETING_TEXT: &str = "Hello! I'm here to assist you with hospital services, appointments, or any questions you have. Just let me know how I can help!";

const UNKNOWN_TEXT: &str = "I'm not sure what you mean. Could you please provide more details or ask about appointments, doctors, visiting hours, or billing?";

const BOOKING_TEXT: &str = "I'd be happy to help you book an appointment. To get started, I'll need some information:\n\n1. What type of appointment do you need? (consultation, follow-up, routine check-up, etc.)\n2. Do you have a preferred doctor or department?\n3. What's your preferred date and time?\n4. What's the reason for your visit?\n\nPlease provide these details so I can assist you better.";

const RESCHEDULE_TEXT: &str = "I can help you reschedule your appointment. Please provide:\n\n1. Your current appointment ID or date/time\n2. Your preferred new date and time\n3. The reason for rescheduling\n\nI'll check availability and make the changes for you.";

const CANCEL_TEXT: &str = "I understand you need to cancel your appointment. Please provide:\n\n1. Your appointment ID or date/time\n2. The reason for cancellation\n\nI'll process the cancellation for you. Please note that we have a 24-hour cancellation policy.";

const VISITING_HOURS_TEXT: &str = "Our visiting hours are:\n\n- Monday - Friday: 8:00 AM - 8:00 PM\n- Saturday - Sunday: 8:00 AM - 6:00 PM\n- Emergency Department: 24/7\n\nPlease note that some departments may have specific visiting hours. Would you like information about a particular department?";

const LOCATION_TEXT: &str = "We are located at:\n\n123 Healthcare Avenue\nMedical District, CA 90210\n\nParking is available in our main lot, and we're easily accessible by public transportation. Would you like directions or parking information?";

const CONTACT_TEXT: &str = "You can reach us at:\n\n- Main Reception: (555) 123-4567\n- Emergency: (555) 123-4568\n- Appointment Line: (555) 123-4569\n- Billing: (555) 123-4570\n\nOur lines are open during visiting hours. For emergencies, call 911 or our emergency line.";

const DOCTOR_LOOKUP_FAILED_TEXT: &str = "I'm having trouble accessing the doctor database right now. Please try again or contact our staff directly.";

/// Front-desk agent: greetings, appointment guidance, doctor availability
/// from the live roster and general hospital information.
pub struct ReceptionAgent {
    doctors: Arc<DoctorService>,
    responder: FreeTextResponder,
    doctor_name_pattern: Option<Regex>,
}

impl ReceptionAgent {
    pub fn new(doctors: Arc<DoctorService>, completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            doctors,
            responder: FreeTextResponder::new(completion, SYSTEM_PROMPT),
            doctor_name_pattern: Regex::new(r"\bdr\.?\s+([a-z][a-z'-]*)(?:\s+([a-z][a-z'-]*))?").ok(),
        }
    }

    async fn handle_appointment(&self, message: &str, context: &AgentContext) -> Result<AgentReply, ChatError> {
        let lower = message.to_lowercase();

        if contains_any(&lower, &["reschedule", "change"]) {
            Ok(canned(RESCHEDULE_TEXT, 0.9))
        } else if contains_keyword(&lower, "cancel") {
            Ok(canned(CANCEL_TEXT, 0.9))
        } else if contains_any(&lower, &["book", "booking", "schedule", "appointment", "slot", "reservation"]) {
            Ok(canned(BOOKING_TEXT, 0.9))
        } else {
            self.responder.respond(message, context, 0.8).await
        }
    }

    async fn handle_doctor_availability(&self, message: &str) -> AgentReply {
        let lookup = async {
            if let Some(name) = self.requested_doctor_name(message) {
                return self.describe_named_doctor(&name).await;
            }
            if let Some(department) = mentioned_department(message) {
                return self.describe_department(department).await;
            }
            self.describe_roster().await
        };

        match lookup.await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Doctor lookup failed: {}", e);
                canned(DOCTOR_LOOKUP_FAILED_TEXT, 0.3)
            }
        }
    }

    /// Candidate names after "Dr.", longest first.
    fn requested_doctor_name(&self, message: &str) -> Option<Vec<String>> {
        let lower = message.to_lowercase();
        let captures = self.doctor_name_pattern.as_ref()?.captures(&lower)?;
        let first = captures.get(1)?.as_str().to_string();

        let mut candidates = Vec::with_capacity(2);
        if let Some(second) = captures.get(2) {
            candidates.push(format!("{} {}", first, second.as_str()));
        }
        candidates.push(first);
        Some(candidates)
    }

    async fn describe_named_doctor(&self, candidates: &[String]) -> Result<AgentReply, ChatError> {
        for candidate in candidates {
            if let Some(doctor) = self.doctors.find_active_by_name(candidate).await? {
                debug!("Matched doctor {} for '{}'", doctor.doctor_id, candidate);
                return Ok(canned(&describe_weekly_hours(&doctor), 0.9));
            }
        }

        let asked = candidates.last().map(String::as_str).unwrap_or_default();
        Ok(canned(
            &format!(
                "I couldn't find a doctor named \"{}\" in our database. Please provide the full name or check the spelling, or ask for availability by department.",
                title_case(asked)
            ),
            0.7,
        ))
    }

    async fn describe_department(&self, department: &str) -> Result<AgentReply, ChatError> {
        let department = title_case(department);
        let doctors = self.doctors.find_active_in_department(&department).await?;

        if doctors.is_empty() {
            return Ok(canned(
                &format!(
                    "I don't see any available doctors in the {} department at the moment. Would you like to check another department or contact our reception desk for assistance?",
                    department
                ),
                0.7,
            ));
        }

        let list = doctors
            .iter()
            .map(|d| format!("- Dr. {} ({}) - {} years experience", d.full_name(), d.specialization, d.experience))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(canned(
            &format!(
                "Here are the available doctors in {}:\n\n{}\n\nWould you like to book an appointment with any of these doctors?",
                department, list
            ),
            0.9,
        ))
    }

    async fn describe_roster(&self) -> Result<AgentReply, ChatError> {
        let doctors = self.doctors.list_doctors(&DoctorSearchFilters::active_only()).await?;

        if doctors.is_empty() {
            return Ok(canned(
                "I couldn't find any available doctors at the moment. Please specify a doctor's name or department, or contact our staff directly.",
                0.7,
            ));
        }

        let list = doctors
            .iter()
            .map(|d| format!("- Dr. {} ({}) - {} years experience", d.full_name(), d.department, d.experience))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(canned(
            &format!(
                "Here are all our available doctors:\n\n{}\n\nPlease specify a doctor's name or department to check their availability.",
                list
            ),
            0.9,
        ))
    }

    async fn handle_faq(&self, message: &str, context: &AgentContext) -> Result<AgentReply, ChatError> {
        let lower = message.to_lowercase();

        if contains_any(&lower, &["hours", "open", "close", "visitor", "visiting hours"]) {
            Ok(canned(VISITING_HOURS_TEXT, 1.0))
        } else if contains_any(&lower, &["location", "address", "parking"]) {
            Ok(canned(LOCATION_TEXT, 1.0))
        } else if contains_any(&lower, &["phone", "contact"]) {
            Ok(canned(CONTACT_TEXT, 1.0))
        } else {
            self.responder.respond(message, context, 0.8).await
        }
    }
}

#[async_trait]
impl Agent for ReceptionAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Reception
    }

    async fn process_message(&self, message: &str, context: &AgentContext) -> Result<AgentReply, ChatError> {
        if let Some(escalation) = escalate_if_emergency(message) {
            return Ok(escalation);
        }

        match classify_reception(message) {
            ReceptionIntent::Greeting => Ok(canned(GREETING_TEXT, 0.9)),
            ReceptionIntent::Appointment => self.handle_appointment(message, context).await,
            ReceptionIntent::DoctorAvailability => Ok(self.handle_doctor_availability(message).await),
            ReceptionIntent::Faq => self.handle_faq(message, context).await,
            ReceptionIntent::Intake => Ok(AgentReply::HandOff(AgentKind::Nurse)),
            ReceptionIntent::Billing => Ok(AgentReply::HandOff(AgentKind::Billing)),
            ReceptionIntent::Unknown => Ok(canned(UNKNOWN_TEXT, 0.5)),
        }
    }
}

/// "Dr. Sarah Chen (Cardiologist, Cardiology) is available at ..." with one
/// line per open weekly window, Sunday first.
pub fn describe_weekly_hours(doctor: &Doctor) -> String {
    let mut windows: Vec<_> = doctor.availability.iter().filter(|slot| slot.is_available).collect();
    windows.sort_by_key(|slot| (slot.day_of_week, slot.start_time));

    if windows.is_empty() {
        return format!(
            "Dr. {} has no available time slots at the moment. Would you like to check another doctor or contact our reception desk?",
            doctor.full_name()
        );
    }

    let lines = windows
        .iter()
        .map(|slot| format!("- {}: {} - {}", weekday_name(slot.day_of_week), slot.start_time, slot.end_time))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Dr. {} ({}, {}) is available at the following times:\n\n{}\n\nWould you like to book an appointment?",
        doctor.full_name(),
        doctor.specialization,
        doctor.department,
        lines
    )
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
