use crate::plans::models::PlanRequest;

/// Role statement for plan generation.
pub const PLAN_ROLE: &str = "You are a fitness coach and nutritionist writing example \
    weekly workout and nutrition plans for a fitness app. \
    Meals must reflect the user's culture.";

/// Plan prompt template.
/// Replace: {weight}, {height}, {goal}, {culture}
pub const PLAN_PROMPT_TEMPLATE: &str = r#"Create a 1-week (7 days, Monday to Sunday) workout and nutrition plan as JSON.

User:
- Weight: {weight} kg
- Height: {height} cm
- Goal: {goal}
- Culture: {culture}

Return a JSON object with this EXACT schema (no extra fields):
{
  "nutrition": {
    "dailyCalories": 2000,
    "days": [
      {
        "day": "Monday",
        "meals": [
          {"meal": "Breakfast", "food": "Eggs with whole-grain bread", "calories": 400}
        ]
      }
    ]
  },
  "workout": {
    "days": [
      {
        "day": "Monday",
        "focus": "Upper body",
        "exercises": [
          {"exercise": "Push-ups", "sets": 3, "reps": 15},
          {"exercise": "Jogging", "durationMinutes": 20}
        ]
      }
    ]
  }
}

Rules:
1. Both "nutrition.days" and "workout.days" contain exactly 7 entries, one per weekday
2. Every nutrition day lists at least breakfast, lunch and dinner
3. Rest days keep their entry with an empty "exercises" array
4. "reps" is a number or a short range such as "8-12""#;

/// Fills the plan template with the user's profile.
pub fn build_plan_prompt(request: &PlanRequest) -> String {
    PLAN_PROMPT_TEMPLATE
        .replace("{weight}", &request.weight.to_string())
        .replace("{height}", &request.height.to_string())
        .replace("{goal}", &request.goal)
        .replace("{culture}", &request.culture)
}
