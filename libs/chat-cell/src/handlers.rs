use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::{error::AppError, AppJson};

use crate::models::{ChatError, ChatRequest, FrontDeskBookingRequest};
use crate::services::{AgentManager, FrontDeskService};

/// Shared state for the chat routes.
pub struct ChatState {
    pub manager: Arc<AgentManager>,
    pub front_desk: Arc<FrontDeskService>,
}

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::Completion(msg) => AppError::ExternalService(msg),
            ChatError::ValidationError(msg) => AppError::ValidationError(msg),
            ChatError::Doctor(e) => e.into(),
            ChatError::Patient(e) => e.into(),
            ChatError::Appointment(e) => e.into(),
        }
    }
}

#[axum::debug_handler]
pub async fn chat(
    State(state): State<Arc<ChatState>>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<Value>, AppError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?;

    // Sessions are caller-held; issue an id so follow-up turns can be correlated in logs.
    let session_id = request
        .context
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    debug!("Chat message for session {}", session_id);

    let response = state.manager.process_message(message, &request.context).await;

    Ok(Json(json!({
        "sessionId": session_id,
        "response": response.content,
        "confidence": response.confidence,
        "nextAgent": response.next_agent,
        "metadata": response.metadata
    })))
}

#[axum::debug_handler]
pub async fn capabilities(State(state): State<Arc<ChatState>>) -> Json<Value> {
    Json(json!({ "agents": state.manager.capabilities() }))
}

#[axum::debug_handler]
pub async fn front_desk_booking(
    State(state): State<Arc<ChatState>>,
    AppJson(request): AppJson<FrontDeskBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = state.front_desk.book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment booked successfully",
            "patient": booking.patient,
            "patientCreated": booking.patient_created,
            "appointment": booking.appointment
        })),
    ))
}
