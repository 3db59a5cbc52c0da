use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::normalizer::NormalizeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{"status": "error", "details": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingInput(String),

    /// The request body could not be read at all (too large, broken stream).
    #[error("{message}")]
    PayloadRejected { status: StatusCode, message: String },

    #[error("{0} model is not available")]
    ModelUnavailable(&'static str),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Upstream model call failed: {0}")]
    Upstream(#[from] LlmError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadRejected { status, .. } => *status,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Normalize(_) | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Model text that could not be parsed, echoed back for diagnostics.
    fn offending_text(&self) -> Option<&str> {
        match self {
            AppError::Normalize(e) => e.offending_text(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.to_string();

        match &self {
            AppError::MissingInput(msg) => tracing::warn!("Rejected request: {msg}"),
            AppError::PayloadRejected { status, message } => {
                tracing::warn!("Rejected request body ({status}): {message}")
            }
            AppError::ModelUnavailable(endpoint) => {
                tracing::error!("{endpoint} model requested but its client is not initialized")
            }
            AppError::Normalize(e) => tracing::error!("Model reply rejected: {e}"),
            AppError::Upstream(e) => tracing::error!("LLM error: {e}"),
        }

        let mut body = json!({
            "status": "error",
            "details": details,
        });

        if let Some(text) = self.offending_text() {
            body["raw_text"] = json!(text);
        }

        (status, Json(body)).into_response()
    }
}

/// Unwraps a JSON body for handlers that validate fields themselves.
///
/// A missing content type or unparseable JSON reads as `null`, so the handler
/// reports which fields are missing. A body that could not be buffered (over
/// the size limit, broken stream) keeps its own status and message.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::BytesRejection(e)) => Err(AppError::PayloadRejected {
            status: e.status(),
            message: e.body_text(),
        }),
        Err(_) => Ok(Value::Null),
    }
}
