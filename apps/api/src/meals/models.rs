use serde::{Deserialize, Serialize};

use crate::normalizer::ReplySchema;

/// One recognized food item with its estimated macros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub estimated_serving_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Full analysis of one meal photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub items: Vec<FoodItem>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

impl ReplySchema for MealAnalysis {
    const NAME: &'static str = "meal analysis";

    fn validate(&self) -> Result<(), String> {
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err("food item with an empty name".to_string());
            }
            let values = [
                item.estimated_serving_g,
                item.calories,
                item.protein_g,
                item.carbs_g,
                item.fat_g,
            ];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("negative estimate for '{}'", item.name));
            }
        }

        let totals = [
            self.total_calories,
            self.total_protein,
            self.total_carbs,
            self.total_fat,
        ];
        if totals.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("negative meal total".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysisResponse {
    pub status: &'static str,
    pub meal_analysis: MealAnalysis,
}
