use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::info;

use crate::chatbot::models::{user_message, ChatAdvice};
use crate::chatbot::prompts::CHAT_ROLE;
use crate::chatbot::{CHAT_MAX_OUTPUT_TOKENS, CHAT_TEMPERATURE};
use crate::errors::{json_body, AppError};
use crate::llm_client::{call_json, prompts::system_instruction, GenerationRequest};
use crate::state::{require_model, AppState};

/// POST /api/chatbot
///
/// Answers one fitness or nutrition question. Responds with `{"message": ...}`.
pub async fn handle_chatbot(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatAdvice>, AppError> {
    let body = json_body(body)?;
    let message = user_message(&body)?;
    let llm = require_model(&state.chat_model, "Chatbot")?;

    info!(message_len = message.len(), "Answering chatbot query");

    let system = system_instruction(CHAT_ROLE);
    let request = GenerationRequest::new(&system, message)
        .temperature(CHAT_TEMPERATURE)
        .max_output_tokens(CHAT_MAX_OUTPUT_TOKENS);
    let advice: ChatAdvice = call_json(llm, &request).await?;

    Ok(Json(advice))
}
