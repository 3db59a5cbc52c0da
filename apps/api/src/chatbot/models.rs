use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::normalizer::ReplySchema;

const MISSING_MESSAGE: &str = "Missing 'message' in request body";

/// Reads the user's question out of a JSON body.
pub fn user_message(body: &Value) -> Result<&str, AppError> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::MissingInput(MISSING_MESSAGE.to_string()))
}

/// The chatbot's reply, and also the endpoint's response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAdvice {
    pub message: String,
}

impl ReplySchema for ChatAdvice {
    const NAME: &'static str = "chat advice";

    fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("advice message is empty".to_string());
        }
        Ok(())
    }
}
