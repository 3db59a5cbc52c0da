use std::fmt;

use anyhow::{Context, Result};

use crate::llm_client::GEMINI_API_BASE;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if any model credential is missing.
#[derive(Clone)]
pub struct Config {
    /// Gemini key for meal-image analysis (`calories_API`).
    pub calories_api_key: String,
    /// Gemini key for plan generation (`Plans_API`).
    pub plans_api_key: String,
    /// Gemini key for the chatbot (`Chatbot_API`).
    pub chatbot_api_key: String,
    /// Root of the Gemini REST API (`GEMINI_API_BASE`).
    pub gemini_base_url: String,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        Ok(Config {
            calories_api_key: require("calories_API")?,
            plans_api_key: require("Plans_API")?,
            chatbot_api_key: require("Chatbot_API")?,
            gemini_base_url: lookup("GEMINI_API_BASE")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(DEFAULT_PORT),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

// Keys stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("calories_api_key", &"<redacted>")
            .field("plans_api_key", &"<redacted>")
            .field("chatbot_api_key", &"<redacted>")
            .field("gemini_base_url", &self.gemini_base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
