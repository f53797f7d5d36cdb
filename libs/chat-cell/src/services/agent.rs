use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::models::{AgentContext, AgentKind, AgentReply, AgentResponse, ChatError};
use crate::services::completion::CompletionClient;
use crate::services::intent::is_emergency;

pub const ESCALATION_TEXT: &str = "EMERGENCY: I've detected that you may be experiencing a medical emergency. Please:\n\n1. Call 911 immediately if this is life-threatening\n2. Go to the nearest emergency room\n3. Call our emergency line at (555) 123-4568\n\nI'm connecting you to our emergency staff right now. Please stay on the line.";

pub const TECHNICAL_DIFFICULTIES_TEXT: &str = "I apologize, but I'm experiencing technical difficulties. Please try again or contact our staff directly.";

const NO_COMPLETION_TEXT: &str = "I can help with appointments, doctor availability, visiting hours, symptoms, and billing questions. Could you tell me a bit more about what you need?";

#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn process_message(
        &self,
        message: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, ChatError>;

    /// Reply used when `process_message` fails.
    fn error_response(&self) -> AgentResponse {
        AgentResponse::new(TECHNICAL_DIFFICULTIES_TEXT, 0.0)
    }
}

/// Escalation reply for messages that look like an emergency, if any.
pub fn escalate_if_emergency(message: &str) -> Option<AgentReply> {
    is_emergency(message).then(|| {
        warn!("Emergency keywords detected, escalating");
        AgentReply::Respond(
            AgentResponse::new(ESCALATION_TEXT, 1.0)
                .with_metadata("emergency", json!(true))
                .with_metadata("priority", json!("emergency")),
        )
    })
}

/// Free-text answers from the completion model, scoped by an agent's
/// system prompt. Without a configured model a fixed prompt for more
/// detail is returned.
#[derive(Clone)]
pub struct FreeTextResponder {
    client: Option<Arc<dyn CompletionClient>>,
    system_prompt: &'static str,
}

impl FreeTextResponder {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, system_prompt: &'static str) -> Self {
        Self { client, system_prompt }
    }

    pub async fn respond(
        &self,
        message: &str,
        context: &AgentContext,
        confidence: f64,
    ) -> Result<AgentReply, ChatError> {
        let response = match &self.client {
            Some(client) => {
                let text = client
                    .complete(self.system_prompt, &context.previous_messages, message)
                    .await?;
                AgentResponse::new(text, confidence)
            }
            None => AgentResponse::new(NO_COMPLETION_TEXT, 0.5),
        };

        Ok(AgentReply::Respond(response))
    }
}

/// Shorthand for a canned answer.
pub fn canned(content: &str, confidence: f64) -> AgentReply {
    AgentReply::Respond(AgentResponse::new(content, confidence))
}
