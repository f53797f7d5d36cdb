use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info};

use doctor_cell::services::DoctorService;

use crate::models::{AgentCapabilities, AgentContext, AgentKind, AgentReply, AgentResponse};
use crate::services::agent::Agent;
use crate::services::billing::BillingAgent;
use crate::services::completion::CompletionClient;
use crate::services::intent::route_message;
use crate::services::nurse::NurseAgent;
use crate::services::reception::ReceptionAgent;

/// Routes each message to one agent and follows at most one hand-off.
pub struct AgentManager {
    reception: ReceptionAgent,
    nurse: NurseAgent,
    billing: BillingAgent,
}

impl AgentManager {
    pub fn new(doctors: Arc<DoctorService>, completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            reception: ReceptionAgent::new(doctors, completion.clone()),
            nurse: NurseAgent::new(completion.clone()),
            billing: BillingAgent::new(completion),
        }
    }

    fn agent(&self, kind: AgentKind) -> &dyn Agent {
        match kind {
            AgentKind::Reception => &self.reception,
            AgentKind::Nurse => &self.nurse,
            AgentKind::Billing => &self.billing,
        }
    }

    /// Never fails: agent errors become that agent's apology text.
    pub async fn process_message(&self, message: &str, context: &AgentContext) -> AgentResponse {
        let first = route_message(message);
        debug!("Routing message to {}", first);

        let (handled_by, response) = match self.run(first, message, context).await {
            Ok(AgentReply::Respond(response)) => (first, response),
            Ok(AgentReply::HandOff(next)) => {
                info!("{} handed the message to {}", first, next);
                match self.run(next, message, context).await {
                    Ok(AgentReply::Respond(response)) => (next, response),
                    Ok(AgentReply::HandOff(again)) => {
                        debug!("Ignoring second hand-off from {} to {}", next, again);
                        (next, self.agent(next).error_response())
                    }
                    Err(response) => (next, response),
                }
            }
            Err(response) => (first, response),
        };

        response.with_metadata("agent", json!(handled_by))
    }

    async fn run(
        &self,
        kind: AgentKind,
        message: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, AgentResponse> {
        let agent = self.agent(kind);
        agent.process_message(message, context).await.map_err(|e| {
            error!("{} failed to process message: {}", kind, e);
            agent.error_response()
        })
    }

    pub fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities {
            reception: vec![
                "Appointment booking, rescheduling, and cancellation",
                "Doctor availability lookup",
                "General hospital information and FAQs",
                "Department referrals",
                "Visiting hours and contact information",
            ],
            nurse: vec![
                "Symptom assessment and triage",
                "Patient intake and registration",
                "Emergency situation detection",
                "Department recommendations",
                "Basic health guidance (not medical advice)",
            ],
            billing: vec![
                "Insurance information and verification",
                "Cost estimates and billing explanations",
                "Payment plan arrangements",
                "Billing statement assistance",
                "Financial assistance programs",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatError, ChatMessage, ChatRole};
    use crate::services::completion::MockCompletionClient;
    use doctor_cell::services::InMemoryDoctorStore;

    fn doctors() -> Arc<DoctorService> {
        Arc::new(DoctorService::new(Arc::new(InMemoryDoctorStore::new())))
    }

    fn manager_with(mock: MockCompletionClient) -> AgentManager {
        AgentManager::new(doctors(), Some(Arc::new(mock)))
    }

    #[tokio::test]
    async fn routes_and_tags_the_handling_agent() {
        let manager = AgentManager::new(doctors(), None);

        let response = manager.process_message("I have a persistent cough", &AgentContext::default()).await;
        assert_eq!(response.metadata.unwrap()["agent"], json!("NurseAgent"));
        assert_eq!(response.next_agent, Some(AgentKind::Reception));

        let response = manager.process_message("hello", &AgentContext::default()).await;
        assert_eq!(response.metadata.unwrap()["agent"], json!("ReceptionAgent"));
    }

    #[tokio::test]
    async fn reception_hands_intake_to_the_nurse_once() {
        let manager = AgentManager::new(doctors(), None);

        let response = manager.process_message("I'm a new patient", &AgentContext::default()).await;

        assert!(response.content.starts_with("I'll help you with the patient intake process."));
        assert_eq!(response.metadata.unwrap()["agent"], json!("NurseAgent"));
    }

    #[tokio::test]
    async fn free_text_goes_through_the_completion_client_with_history() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|prompt, history, message| {
                prompt.contains("billing assistant")
                    && history.len() == 1
                    && history[0] == ChatMessage::new(ChatRole::User, "hi")
                    && message == "Tell me about insurance"
            })
            .times(1)
            .returning(|_, _, _| Ok("We take most plans.".to_string()));

        let manager = manager_with(mock);
        let context = AgentContext {
            previous_messages: vec![ChatMessage::new(ChatRole::User, "hi")],
            ..AgentContext::default()
        };

        let response = manager.process_message("Tell me about insurance", &context).await;

        assert_eq!(response.content, "We take most plans.");
        assert_eq!(response.confidence, 0.7);
    }

    #[tokio::test]
    async fn completion_failures_become_the_agent_apology() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .returning(|_, _, _| Err(ChatError::Completion("status 503".to_string())));

        let manager = manager_with(mock);
        let response = manager.process_message("Tell me about insurance", &AgentContext::default()).await;

        assert!(response.content.contains("(555) 123-4570"));
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn canned_answers_skip_the_completion_client() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().times(0);

        let manager = manager_with(mock);
        let response = manager.process_message("what are your visiting hours", &AgentContext::default()).await;

        assert!(response.content.starts_with("Our visiting hours are:"));
    }

    #[test]
    fn capabilities_cover_every_agent() {
        let capabilities = AgentManager::new(doctors(), None).capabilities();
        assert_eq!(capabilities.reception.len(), 5);
        assert_eq!(capabilities.nurse.len(), 5);
        assert_eq!(capabilities.billing.len(), 5);
    }
}
