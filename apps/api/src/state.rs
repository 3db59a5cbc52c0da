use std::sync::Arc;

use tracing::{error, info};

use crate::chatbot::CHAT_MODEL;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{GeminiClient, TextGenerator};
use crate::meals::VISION_MODEL;
use crate::plans::PLAN_MODEL;

pub type SharedGenerator = Arc<dyn TextGenerator>;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Each endpoint owns its own model client, since each is billed to its own
/// API key. A client that failed to build is `None` and its endpoint answers 503.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub meal_model: Option<SharedGenerator>,
    pub plan_model: Option<SharedGenerator>,
    pub chat_model: Option<SharedGenerator>,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let base_url = &config.gemini_base_url;
        let meal_model = connect(
            "Meal analysis",
            &config.calories_api_key,
            VISION_MODEL,
            base_url,
        );
        let plan_model = connect(
            "Plan generation",
            &config.plans_api_key,
            PLAN_MODEL,
            base_url,
        );
        let chat_model = connect("Chatbot", &config.chatbot_api_key, CHAT_MODEL, base_url);

        Self {
            config: Arc::new(config),
            meal_model,
            plan_model,
            chat_model,
        }
    }
}

/// Returns the model for an endpoint or the 503 error naming it.
pub fn require_model<'a>(
    model: &'a Option<SharedGenerator>,
    endpoint: &'static str,
) -> Result<&'a dyn TextGenerator, AppError> {
    model
        .as_deref()
        .ok_or(AppError::ModelUnavailable(endpoint))
}

fn connect(
    endpoint: &str,
    api_key: &str,
    model: &str,
    base_url: &str,
) -> Option<SharedGenerator> {
    match GeminiClient::new(api_key.to_string(), model) {
        Ok(client) => {
            info!("{endpoint} client initialized (model: {model})");
            Some(Arc::new(client.with_base_url(base_url)))
        }
        Err(e) => {
            error!("{endpoint} client failed to initialize: {e}");
            None
        }
    }
}
