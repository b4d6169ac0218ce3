use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = r#"You are an expert nutritionist and food recognition AI.
Analyze the provided image and determine if it contains food.

FIRST: Determine if the image contains food
- Set is_food to true if the image contains any food items
- Set is_food to false if the image does NOT contain food (e.g., objects, people, landscapes, text, documents)
- Set detected_object to describe what you see (e.g., "Grilled Chicken Salad" or "Laptop computer")

IF THE IMAGE CONTAINS FOOD (is_food = true):
1. Identify all visible food items, ingredients, and portion sizes
2. For each ingredient, estimate its weight in grams and calculate individual macros
3. Consider cooking methods (fried, grilled, steamed, etc.) as they affect calories
4. Estimate serving sizes relative to standard references (a fist is about 1 cup, a palm about 3oz of protein)
5. Sum all ingredient macros to get the total meal macros

OUTPUT:
- is_food: true if image contains food, false otherwise
- detected_object: what you see in the image
- food_name: overall meal/dish name (empty string if not food)
- confidence: how clearly the food is identifiable (0.0-1.0, or 0.0 if not food)
- serving_size: total serving in grams or standard units (empty if not food)
- macros: total combined macros for the entire meal (null if not food)
- ingredients: array of each component (empty array if not food)

IF THE IMAGE DOES NOT CONTAIN FOOD, return is_food=false and detected_object only.

Always break down complex meals into their visible components, use middle-ground
estimates when portions are unclear and include fiber where applicable."#;

const USER_PROMPT_TAIL: &str =
    "First determine if it contains food, then provide nutritional information if applicable.";

pub fn user_prompt(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => format!(
            "Analyze this image. Additional context: {}. {}",
            c, USER_PROMPT_TAIL
        ),
        None => format!("Analyze this image. {}", USER_PROMPT_TAIL),
    }
}

fn macro_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "calories": { "type": "INTEGER" },
            "protein": { "type": "NUMBER" },
            "carbs": { "type": "NUMBER" },
            "fat": { "type": "NUMBER" },
            "fiber": { "type": "NUMBER" }
        },
        "required": ["calories", "protein", "carbs", "fat", "fiber"]
    })
}

/// Structured-output schema matching [`crate::nutrition::types::ScanResult`].
pub fn scan_result_schema() -> Value {
    let mut nullable_macros = macro_schema();
    nullable_macros["nullable"] = json!(true);

    json!({
        "type": "OBJECT",
        "properties": {
            "is_food": { "type": "BOOLEAN" },
            "detected_object": { "type": "STRING" },
            "food_name": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "serving_size": { "type": "STRING" },
            "macros": nullable_macros,
            "ingredients": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "weight_grams": { "type": "NUMBER" },
                        "macros": macro_schema()
                    },
                    "required": ["name", "weight_grams", "macros"]
                }
            }
        },
        "required": ["is_food", "detected_object"]
    })
}
