use serde::{Deserialize, Serialize};

use crate::nutrition::types::{Ingredient, MacroBreakdown, ScanResult};

/// Request body for `POST /api/nutrition/scan`.
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroData {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientData {
    pub name: String,
    pub weight_grams: f64,
    pub macros: MacroData,
}

/// Response body of a successful scan. `is_food`/`detected_object` stay server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResponse {
    pub food_name: String,
    pub confidence: f64,
    pub macros: Option<MacroData>,
    pub serving_size: String,
    pub ingredients: Vec<IngredientData>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl From<MacroBreakdown> for MacroData {
    fn from(m: MacroBreakdown) -> Self {
        let m = m.sanitized();
        Self {
            calories: m.calories,
            protein: m.protein,
            carbs: m.carbs,
            fat: m.fat,
            fiber: m.fiber,
        }
    }
}

impl From<Ingredient> for IngredientData {
    fn from(i: Ingredient) -> Self {
        Self {
            name: i.name,
            weight_grams: crate::nutrition::types::non_negative(i.weight_grams),
            macros: i.macros.into(),
        }
    }
}

impl From<ScanResult> for ScanResponse {
    fn from(r: ScanResult) -> Self {
        let confidence = if r.confidence.is_finite() {
            r.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            food_name: r.food_name,
            confidence,
            macros: r.macros.map(MacroData::from),
            serving_size: r.serving_size,
            ingredients: r.ingredients.into_iter().map(IngredientData::from).collect(),
        }
    }
}
