//! Certification assistant chat endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::chat::ChatTurn;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /chat` — answer a question about the certification process.
///
/// Short-circuit answers (pattern matches, off-topic redirects) never
/// fail; only a model call that errors surfaces as an internal error.
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = ctx.assistant.respond(&req.message, &req.history).await?;
    Ok(Json(ChatResponse { response }))
}
