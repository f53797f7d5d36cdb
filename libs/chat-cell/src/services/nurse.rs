use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::models::{AgentContext, AgentKind, AgentReply, AgentResponse, ChatError};
use crate::services::agent::{canned, escalate_if_emergency, Agent, FreeTextResponder};
use crate::services::completion::CompletionClient;
use crate::services::intent::{assess_triage, contains_any};

const SYSTEM_PROMPT: &str = "You are a triage nurse assistant for a hospital. Collect and assess patient symptoms, determine a triage level (low, medium, high, emergency), suggest the appropriate department and gather intake information.

Guidelines:
- Never provide a medical diagnosis or treatment recommendation.
- Always escalate emergency situations immediately.
- Be empathetic and professional, and ask clarifying questions when needed.

Department mapping: chest pain and heart issues to Cardiology; head injuries and neurological symptoms to Neurology; broken bones and joint pain to Orthopedics; children under 18 to Pediatrics; pregnancy-related to Obstetrics; general symptoms to General Medicine; critical cases to the Emergency Department.

You are not a doctor.";

const SYMPTOM_KEYWORDS: &[&str] = &[
    "pain", "hurt", "ache", "symptom", "feeling", "sick", "ill", "fever", "headache", "nausea",
    "dizzy", "tired", "weak", "swelling", "bleeding", "rash", "cough", "sore throat",
];

const INTAKE_KEYWORDS: &[&str] = &[
    "first time", "new patient", "register", "registration", "information", "personal details",
    "contact", "emergency contact",
];

const TRIAGE_KEYWORDS: &[&str] = &[
    "how urgent", "how serious", "when should", "priority", "emergency", "urgent", "immediate",
];

const EMERGENCY_SYMPTOMS: &[&str] = &[
    "chest pain", "difficulty breathing", "unconscious", "severe bleeding", "head injury",
    "stroke symptoms", "heart attack", "seizure",
];

const HIGH_PRIORITY_SYMPTOMS: &[&str] = &[
    "severe pain", "high fever", "broken bone", "deep cut", "sudden vision loss", "severe headache",
];

const MEDIUM_PRIORITY_SYMPTOMS: &[&str] = &[
    "persistent cough", "mild fever", "minor injury", "chronic pain", "digestive issues", "skin rash",
];

const EMERGENCY_SYMPTOM_TEXT: &str = "This sounds like a medical emergency. I'm immediately connecting you to our emergency department. Please stay on the line and don't hang up.";

const HIGH_PRIORITY_TEXT: &str = "These symptoms require prompt medical attention. I recommend you visit our emergency department or urgent care within the next 2-4 hours. Would you like me to help you schedule an urgent appointment?";

const MEDIUM_PRIORITY_TEXT: &str = "These symptoms should be evaluated by a healthcare provider within 24-48 hours. I can help you schedule an appointment with an appropriate specialist. Would you like me to connect you to our reception to book an appointment?";

const SYMPTOM_QUESTIONS_TEXT: &str = "I understand you're experiencing symptoms. To better assist you, I need to gather some information:\n\n1. How long have you been experiencing these symptoms?\n2. How severe would you rate them on a scale of 1-10?\n3. Have you experienced similar symptoms before?\n4. Are you currently taking any medications?\n\nThis will help me determine the best course of action for your care.";

const INTAKE_TEXT: &str = "I'll help you with the patient intake process. I need to collect some basic information:\n\n1. Full name (first and last)\n2. Date of birth\n3. Contact information (phone and email)\n4. Emergency contact name and phone number\n5. Insurance information (if available)\n6. Any known allergies or current medications\n\nPlease provide this information so I can help you get registered in our system.";

/// Symptom assessment, triage and patient intake guidance.
pub struct NurseAgent {
    responder: FreeTextResponder,
}

impl NurseAgent {
    pub fn new(completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            responder: FreeTextResponder::new(completion, SYSTEM_PROMPT),
        }
    }

    fn assess_symptoms(&self, lower: &str) -> AgentReply {
        if contains_any(lower, EMERGENCY_SYMPTOMS) {
            warn!("Emergency symptoms reported");
            return AgentReply::Respond(
                AgentResponse::new(EMERGENCY_SYMPTOM_TEXT, 1.0)
                    .with_metadata("emergency", json!(true))
                    .with_metadata("priority", json!("emergency")),
            );
        }

        if contains_any(lower, HIGH_PRIORITY_SYMPTOMS) {
            return AgentReply::Respond(
                AgentResponse::new(HIGH_PRIORITY_TEXT, 0.9).suggest(AgentKind::Reception),
            );
        }

        if contains_any(lower, MEDIUM_PRIORITY_SYMPTOMS) {
            return AgentReply::Respond(
                AgentResponse::new(MEDIUM_PRIORITY_TEXT, 0.8).suggest(AgentKind::Reception),
            );
        }

        canned(SYMPTOM_QUESTIONS_TEXT, 0.7)
    }

    fn triage(&self, message: &str) -> AgentReply {
        let triage = assess_triage(message);
        info!("Triage assessed as {} for {}", triage.level, triage.department);

        let content = format!(
            "Based on your symptoms, I've assessed your triage level as {} priority. {}\n\nI recommend you see our {} department. Would you like me to help you schedule an appointment?",
            triage.level, triage.urgency, triage.department
        );

        AgentReply::Respond(
            AgentResponse::new(content, 0.8)
                .suggest(AgentKind::Reception)
                .with_metadata("triageLevel", json!(triage.level))
                .with_metadata("assignedDepartment", json!(triage.department)),
        )
    }
}

#[async_trait]
impl Agent for NurseAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Nurse
    }

    async fn process_message(&self, message: &str, context: &AgentContext) -> Result<AgentReply, ChatError> {
        let lower = message.to_lowercase();

        // Specific emergency symptoms get the department hand-over text
        // rather than the generic escalation.
        if contains_any(&lower, EMERGENCY_SYMPTOMS) {
            return Ok(self.assess_symptoms(&lower));
        }
        if let Some(escalation) = escalate_if_emergency(message) {
            return Ok(escalation);
        }

        if contains_any(&lower, SYMPTOM_KEYWORDS) {
            Ok(self.assess_symptoms(&lower))
        } else if contains_any(&lower, INTAKE_KEYWORDS) {
            Ok(canned(INTAKE_TEXT, 0.9))
        } else if contains_any(&lower, TRIAGE_KEYWORDS) {
            Ok(self.triage(message))
        } else {
            self.responder.respond(message, context, 0.7).await
        }
    }

    fn error_response(&self) -> AgentResponse {
        AgentResponse::new(
            "I apologize, but I'm experiencing technical difficulties. Please try again or contact our nursing staff directly.",
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::agent::ESCALATION_TEXT;

    async fn respond(message: &str) -> AgentResponse {
        let agent = NurseAgent::new(None);
        match agent.process_message(message, &AgentContext::default()).await.unwrap() {
            AgentReply::Respond(response) => response,
            AgentReply::HandOff(kind) => panic!("unexpected hand-off to {}", kind),
        }
    }

    #[tokio::test]
    async fn symptom_severity_bands() {
        let emergency = respond("I have chest pain").await;
        assert_eq!(emergency.content, EMERGENCY_SYMPTOM_TEXT);
        assert_eq!(emergency.confidence, 1.0);

        let high = respond("I have a high fever since yesterday").await;
        assert_eq!(high.content, HIGH_PRIORITY_TEXT);
        assert_eq!(high.next_agent, Some(AgentKind::Reception));

        let medium = respond("I've got a persistent cough").await;
        assert_eq!(medium.content, MEDIUM_PRIORITY_TEXT);

        let low = respond("I'm feeling a bit tired").await;
        assert_eq!(low.content, SYMPTOM_QUESTIONS_TEXT);
        assert_eq!(low.next_agent, None);
    }

    #[tokio::test]
    async fn generic_emergency_words_escalate() {
        let response = respond("there was an accident").await;
        assert_eq!(response.content, ESCALATION_TEXT);
        assert_eq!(response.metadata.unwrap()["emergency"], json!(true));
    }

    #[tokio::test]
    async fn intake_and_triage() {
        assert_eq!(respond("this is my first time here").await.content, INTAKE_TEXT);

        let triage = respond("what priority is a fracture").await;
        assert!(triage.content.starts_with("Based on your symptoms, I've assessed your triage level as MEDIUM priority."));
        assert!(triage.content.contains("our Orthopedics department"));
        assert_eq!(triage.metadata.unwrap()["triageLevel"], json!("medium"));
    }
}
