use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, ChatState};

pub fn chat_routes(state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/", post(handlers::chat))
        .route("/capabilities", get(handlers::capabilities))
        .route("/book", post(handlers::front_desk_booking))
        .with_state(state)
}
