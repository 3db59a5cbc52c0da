/// LLM Client: the single point of entry for all generative-model calls.
///
/// Handlers never talk to the Gemini API directly. They build a
/// `GenerationRequest`, hand it to a `TextGenerator`, and get back a typed
/// reply through `call_json`, which runs the raw text through the
/// Response Normalizer.
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::normalizer::{conform, normalize_reply, ReplySchema};

pub mod prompts;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Response blocked by the model provider: {0}")]
    Blocked(String),

    #[error("Model client not configured: {0}")]
    NotConfigured(String),
}

/// An image sent alongside the prompt.
#[derive(Debug, Clone, Copy)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// Everything a single model call needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub image: Option<InlineImage<'a>>,
    /// Ask the provider to constrain output to JSON.
    pub expect_json: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(system: &'a str, prompt: &'a str) -> Self {
        Self {
            system,
            prompt,
            image: None,
            expect_json: false,
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_image(mut self, image: InlineImage<'a>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn json_output(mut self) -> Self {
        self.expect_json = true;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// The narrow seam between handlers and whatever model backs them.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>`; tests swap in a stub.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs and `/health`.
    fn model(&self) -> &str;

    /// Returns the raw text of the model's reply.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError>;
}

/// Calls the model and coerces its reply into `T`.
pub async fn call_json<T: ReplySchema>(
    llm: &dyn TextGenerator,
    request: &GenerationRequest<'_>,
) -> Result<T, AppError> {
    let raw = llm.generate(request).await?;
    debug!(
        model = llm.model(),
        schema = T::NAME,
        reply_len = raw.len(),
        "Model reply received"
    );
    let object = normalize_reply(&raw)?;
    Ok(conform(object)?)
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenates every text part of the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked(reason));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::Blocked("SAFETY".to_string()));
        }
        if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
            warn!("Gemini stopped at the output token limit; reply may be truncated");
        }

        Ok(candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client bound to one API key and model.
/// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured("API key is empty".to_string()));
        }

        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API root (a proxy, or a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body<'a>(
        request: &'a GenerationRequest<'a>,
        image_b64: Option<String>,
    ) -> GenerateContentRequest<'a> {
        let mut parts = vec![RequestPart::Text {
            text: request.prompt,
        }];
        if let (Some(image), Some(data)) = (request.image, image_b64) {
            parts.push(RequestPart::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type,
                    data,
                },
            });
        }

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            system_instruction: SystemInstruction {
                parts: vec![RequestPart::Text {
                    text: request.system,
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type: request.expect_json.then_some("application/json"),
            },
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
        let image_b64 = request
            .image
            .map(|image| general_purpose::STANDARD.encode(image.data));
        let body = Self::build_body(request, image_b64);
        let url = self.endpoint();

        debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            "Sending request to Gemini API"
        );

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Gemini call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let error_body = response.text().await.unwrap_or_default();
                warn!("Gemini API returned {}: {}", status, error_body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_body,
                });
                continue;
            }

            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<GeminiError>(&error_body)
                    .map(|e| e.error.message)
                    .unwrap_or(error_body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let reply: GenerateContentResponse = response.json().await?;
            let usage = reply.usage_metadata.as_ref();
            debug!(
                "Gemini call succeeded: input_tokens={}, output_tokens={}",
                usage.and_then(|u| u.prompt_token_count).unwrap_or(0),
                usage.and_then(|u| u.candidates_token_count).unwrap_or(0)
            );

            return reply.into_text();
        }

        // Every attempt ended in a 429: report the rate limit, not the last body.
        Err(match last_error {
            Some(LlmError::Api { status: 429, .. }) | None => LlmError::RateLimited {
                retries: MAX_RETRIES,
            },
            Some(e) => e,
        })
    }
}
