// Meal-image analysis: a photo goes in, per-item macro estimates come out.

pub mod handlers;
pub mod models;
pub mod prompts;

/// Vision-capable model used for meal photos.
pub const VISION_MODEL: &str = "gemini-2.5-flash";
