use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::normalizer::ReplySchema;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Validated user profile for plan generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    pub goal: String,
    pub culture: String,
}

impl PlanRequest {
    /// Reads the profile out of an arbitrary JSON body.
    ///
    /// `weight` and `height` may arrive as numbers or numeric strings (form
    /// inputs often post strings) and must be positive. `goal` and `culture`
    /// must be non-empty strings. Every missing field is named in the error.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let weight = positive_number(body.get("weight"));
        let height = positive_number(body.get("height"));
        let goal = non_empty_text(body.get("goal"));
        let culture = non_empty_text(body.get("culture"));

        match (weight, height, goal, culture) {
            (Some(weight), Some(height), Some(goal), Some(culture)) => Ok(Self {
                weight,
                height,
                goal,
                culture,
            }),
            (weight, height, goal, culture) => {
                let missing: Vec<&str> = [
                    ("weight", weight.is_none()),
                    ("height", height.is_none()),
                    ("goal", goal.is_none()),
                    ("culture", culture.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();

                Err(AppError::MissingInput(format!(
                    "Missing weight, height, goal, or culture (missing or invalid: {})",
                    missing.join(", ")
                )))
            }
        }
    }
}

fn positive_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number > 0.0).then_some(number)
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// ────────────────────────────────────────────────────────────────────────────
// Model reply schema
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    /// "Breakfast", "Lunch", "Snack", ...
    pub meal: String,
    pub food: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionDay {
    pub day: String,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_calories: Option<f64>,
    pub days: Vec<NutritionDay>,
}

/// Reps are a count (`12`) or a range/description (`"8-12"`, `"to failure"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub exercise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<Reps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Empty on rest days.
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub days: Vec<WorkoutDay>,
}

/// One week of meals and training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub nutrition: NutritionPlan,
    pub workout: WorkoutPlan,
}

impl ReplySchema for WeeklyPlan {
    const NAME: &'static str = "weekly plan";

    fn validate(&self) -> Result<(), String> {
        if self.nutrition.days.is_empty() {
            return Err("nutrition plan has no days".to_string());
        }
        if self.workout.days.is_empty() {
            return Err("workout plan has no days".to_string());
        }
        if let Some(day) = self.nutrition.days.iter().find(|d| d.meals.is_empty()) {
            return Err(format!("no meals planned for {}", day.day));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub plan: WeeklyPlan,
}
