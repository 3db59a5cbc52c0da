use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::{AppState, SharedGenerator};

/// GET /health
/// Returns service version and which model clients are available.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let model = |m: &Option<SharedGenerator>| m.as_ref().map(|g| g.model().to_string());

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "models": {
            "mealAnalysis": model(&state.meal_model),
            "planGeneration": model(&state.plan_model),
            "chatbot": model(&state.chat_model),
        }
    }))
}
