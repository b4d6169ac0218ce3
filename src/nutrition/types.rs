use serde::{Deserialize, Deserializer, Serialize};

/// Macro totals as estimated by the inference engine. Grams except calories (kcal).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroBreakdown {
    #[serde(deserialize_with = "whole_calories")]
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl MacroBreakdown {
    /// Clamps gram values onto the non-negative reals; NaN/inf become 0.
    pub fn sanitized(self) -> Self {
        Self {
            calories: self.calories,
            protein: non_negative(self.protein),
            carbs: non_negative(self.carbs),
            fat: non_negative(self.fat),
            fiber: non_negative(self.fiber),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub weight_grams: f64,
    pub macros: MacroBreakdown,
}

/// Structured answer of the inference engine for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub is_food: bool,
    #[serde(default)]
    pub detected_object: String,
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub serving_size: String,
    #[serde(default)]
    pub macros: Option<MacroBreakdown>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl ScanResult {
    /// A result for an image that shows no food: every food field empty.
    pub fn not_food(detected_object: impl Into<String>) -> Self {
        Self {
            is_food: false,
            detected_object: detected_object.into(),
            food_name: String::new(),
            confidence: 0.0,
            serving_size: String::new(),
            macros: None,
            ingredients: Vec::new(),
        }
    }

    /// Sum of the per-ingredient macros. Advisory only; nothing enforces it equals `macros`.
    pub fn ingredient_totals(&self) -> MacroBreakdown {
        self.ingredients
            .iter()
            .fold(MacroBreakdown::default(), |acc, i| MacroBreakdown {
                calories: acc.calories.saturating_add(i.macros.calories),
                protein: acc.protein + i.macros.protein,
                carbs: acc.carbs + i.macros.carbs,
                fat: acc.fat + i.macros.fat,
                fiber: acc.fiber + i.macros.fiber,
            })
    }
}

/// Accepts `450` as well as `450.0` (or `449.6`); rounds and clamps into `u32`.
fn whole_calories<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("calories must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}

pub(crate) fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_not_food_with_missing_fields() {
        let raw = r#"{"is_food": false, "detected_object": "Laptop computer"}"#;
        let result: ScanResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result, ScanResult::not_food("Laptop computer"));
    }

    #[test]
    fn calories_accept_float_answers() {
        let parse = |raw: &str| serde_json::from_str::<MacroBreakdown>(raw).map(|m| m.calories);
        let body = |cal: &str| format!(r#"{{"calories":{},"protein":1,"carbs":2,"fat":3,"fiber":0}}"#, cal);

        assert_eq!(parse(&body("450")).unwrap(), 450);
        assert_eq!(parse(&body("450.0")).unwrap(), 450);
        assert_eq!(parse(&body("449.6")).unwrap(), 450);
        assert_eq!(parse(&body("-3")).unwrap(), 0);
        assert!(parse(&body("\"lots\"")).is_err());
    }

    #[test]
    fn sanitized_clamps_bad_grams() {
        let m = MacroBreakdown {
            calories: 10,
            protein: -1.0,
            carbs: f64::NAN,
            fat: f64::INFINITY,
            fiber: 2.5,
        }
        .sanitized();
        assert_eq!(m.protein, 0.0);
        assert_eq!(m.carbs, 0.0);
        assert_eq!(m.fat, 0.0);
        assert_eq!(m.fiber, 2.5);
        assert_eq!(m.calories, 10);
    }

    #[test]
    fn ingredient_totals_sum_components() {
        let mut result = ScanResult::not_food("");
        result.ingredients = vec![
            Ingredient {
                name: "rice".into(),
                weight_grams: 150.0,
                macros: MacroBreakdown { calories: 200, protein: 4.0, carbs: 44.0, fat: 0.5, fiber: 0.6 },
            },
            Ingredient {
                name: "beans".into(),
                weight_grams: 100.0,
                macros: MacroBreakdown { calories: 130, protein: 9.0, carbs: 23.0, fat: 0.5, fiber: 7.0 },
            },
        ];
        let totals = result.ingredient_totals();
        assert_eq!(totals.calories, 330);
        assert!((totals.protein - 13.0).abs() < 1e-9);
        assert!((totals.fiber - 7.6).abs() < 1e-9);
    }
}
