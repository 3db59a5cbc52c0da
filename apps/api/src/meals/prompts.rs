/// Role statement for meal analysis.
pub const MEAL_ANALYSIS_ROLE: &str =
    "You are a nutrition analyst estimating the contents of meal photos.";

/// Instruction sent with the image. The schema shown is the exact shape expected back.
pub const MEAL_ANALYSIS_PROMPT: &str = r#"Analyze the food items in this image. For each item, estimate:
- name
- estimated serving size in grams
- approximate calories
- protein in grams
- carbs in grams
- fat in grams

Output ONLY valid JSON in this format:
{
  "items": [
    {
      "name": "chicken breast",
      "estimatedServingG": 150,
      "calories": 250,
      "proteinG": 30,
      "carbsG": 0,
      "fatG": 5
    }
  ],
  "totalCalories": 250,
  "totalProtein": 30,
  "totalCarbs": 0,
  "totalFat": 5
}

Totals are the sums over all items. If no food is visible, return an empty "items" array and zero totals."#;
