// Single-turn fitness and nutrition advice.

pub mod handlers;
pub mod models;
pub mod prompts;

pub const CHAT_MODEL: &str = "gemini-2.5-flash";
/// Sampling temperature for advice replies.
pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 2048;
