pub mod health;
pub mod state;
pub mod turn;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::api::sse;
use crate::api::AppState;

/// Error body shared by the JSON endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Create the main API router
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/state", get(state::get_state))
        .route("/refresh_state", get(state::refresh_state))
        .route("/reset_state", post(state::reset_state))
        .route("/player1/turn", get(turn::player_one_turn))
        .route("/player2/turn", get(turn::player_two_turn))
        .route("/subscribe", get(sse::sse_handler))
        .route("/health", get(health::health_handler))
        .with_state(state)
}
