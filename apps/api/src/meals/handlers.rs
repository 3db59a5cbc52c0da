use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{call_json, prompts::system_instruction, GenerationRequest, InlineImage};
use crate::meals::models::{MealAnalysis, MealAnalysisResponse};
use crate::meals::prompts::{MEAL_ANALYSIS_PROMPT, MEAL_ANALYSIS_ROLE};
use crate::state::{require_model, AppState};

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "mealImage";
const DEFAULT_MIME: &str = "image/jpeg";

struct UploadedImage {
    mime_type: String,
    data: Bytes,
}

/// POST /api/analyze-meal-image
///
/// Accepts a multipart upload with a `mealImage` part and returns per-item
/// macro estimates for the pictured meal.
pub async fn handle_analyze_meal_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MealAnalysisResponse>, AppError> {
    let multipart = multipart.map_err(|e| {
        AppError::MissingInput(format!("Expected a multipart upload with '{IMAGE_FIELD}': {e}"))
    })?;
    let image = read_image(multipart).await?;
    let llm = require_model(&state.meal_model, "Meal analysis")?;

    info!(
        mime_type = %image.mime_type,
        bytes = image.data.len(),
        "Analyzing meal image"
    );

    let system = system_instruction(MEAL_ANALYSIS_ROLE);
    let request = GenerationRequest::new(&system, MEAL_ANALYSIS_PROMPT).with_image(InlineImage {
        mime_type: &image.mime_type,
        data: &image.data,
    });
    let meal_analysis: MealAnalysis = call_json(llm, &request).await?;

    Ok(Json(MealAnalysisResponse {
        status: "success",
        meal_analysis,
    }))
}

/// Pulls the `mealImage` part out of the form; other parts are skipped.
async fn read_image(mut multipart: Multipart) -> Result<UploadedImage, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Invalid multipart payload", e))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(DEFAULT_MIME)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error("Could not read image upload", e))?;

        if data.is_empty() {
            break;
        }
        return Ok(UploadedImage { mime_type, data });
    }

    Err(AppError::MissingInput("No image provided".to_string()))
}

/// An oversized upload keeps its 413; anything else is a malformed form.
fn upload_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadRejected {
            status: e.status(),
            message: e.body_text(),
        };
    }
    AppError::MissingInput(format!("{context}: {e}"))
}
