// Weekly plan generation: a user profile goes in, seven days of meals and
// workouts come out.

pub mod handlers;
pub mod models;
pub mod prompts;

pub const PLAN_MODEL: &str = "gemini-1.5-flash";
