use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::info;

use crate::errors::{json_body, AppError};
use crate::llm_client::{call_json, prompts::system_instruction, GenerationRequest};
use crate::plans::models::{PlanRequest, PlanResponse, WeeklyPlan};
use crate::plans::prompts::{build_plan_prompt, PLAN_ROLE};
use crate::state::{require_model, AppState};

/// POST /api/generate-plan
///
/// Generates a seven-day nutrition and workout plan for the posted profile.
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PlanResponse>, AppError> {
    let body = json_body(body)?;
    let request = PlanRequest::from_json(&body)?;
    let llm = require_model(&state.plan_model, "Plan generation")?;

    info!(goal = %request.goal, culture = %request.culture, "Generating weekly plan");

    let system = system_instruction(PLAN_ROLE);
    let prompt = build_plan_prompt(&request);
    let generation = GenerationRequest::new(&system, &prompt).json_output();
    let plan: WeeklyPlan = call_json(llm, &generation).await?;

    Ok(Json(PlanResponse {
        status: "success",
        plan,
    }))
}
