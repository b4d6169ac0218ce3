//! Deterministic analyzer for local runs and tests.
//!
//! Returns a canned outcome without network access. Invocations are counted
//! and the last context text is kept so tests can inspect what the handler sent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use super::{AdapterFailure, FoodAnalyzer, ImageInput};
use crate::nutrition::types::{Ingredient, MacroBreakdown, ScanResult};

#[derive(Debug, Clone)]
enum Outcome {
    Result(ScanResult),
    Failure(String),
}

#[derive(Debug)]
pub struct FixtureAnalyzer {
    outcome: Outcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_context: RwLock<Option<String>>,
}

impl Default for FixtureAnalyzer {
    fn default() -> Self {
        Self::with_result(grilled_chicken_salad())
    }
}

#[allow(dead_code)]
impl FixtureAnalyzer {
    pub fn with_result(result: ScanResult) -> Self {
        Self {
            outcome: Outcome::Result(result),
            delay: None,
            calls: AtomicUsize::new(0),
            last_context: RwLock::new(None),
        }
    }

    pub fn not_food(detected_object: &str) -> Self {
        Self::with_result(ScanResult::not_food(detected_object))
    }

    /// Always fails with a transport error carrying `detail`.
    pub fn failing(detail: &str) -> Self {
        Self {
            outcome: Outcome::Failure(detail.to_string()),
            ..Self::default()
        }
    }

    /// Sleeps before answering; used to exercise the inference deadline.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<String> {
        self.last_context
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FoodAnalyzer for FixtureAnalyzer {
    async fn analyze(
        &self,
        _image: ImageInput,
        context: Option<&str>,
    ) -> Result<ScanResult, AdapterFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_context.write() {
            *slot = context.map(str::to_string);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            Outcome::Result(result) => Ok(result.clone()),
            Outcome::Failure(detail) => Err(AdapterFailure::Transport(detail.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fixture"
    }
}

/// The canned plate: three ingredients summing to the meal totals.
pub fn grilled_chicken_salad() -> ScanResult {
    ScanResult {
        is_food: true,
        detected_object: "Grilled Chicken Salad".into(),
        food_name: "Grilled Chicken Salad".into(),
        confidence: 0.92,
        serving_size: "1 plate (350g)".into(),
        macros: Some(MacroBreakdown {
            calories: 450,
            protein: 35.5,
            carbs: 25.0,
            fat: 22.0,
            fiber: 8.5,
        }),
        ingredients: vec![
            Ingredient {
                name: "Grilled chicken breast".into(),
                weight_grams: 120.0,
                macros: MacroBreakdown { calories: 200, protein: 31.0, carbs: 0.0, fat: 5.0, fiber: 0.0 },
            },
            Ingredient {
                name: "Mixed greens".into(),
                weight_grams: 180.0,
                macros: MacroBreakdown { calories: 70, protein: 3.5, carbs: 18.0, fat: 1.0, fiber: 7.0 },
            },
            Ingredient {
                name: "Olive oil vinaigrette".into(),
                weight_grams: 50.0,
                macros: MacroBreakdown { calories: 180, protein: 1.0, carbs: 7.0, fat: 16.0, fiber: 1.5 },
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn image() -> ImageInput {
        ImageInput {
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
            mime_type: "image/jpeg",
        }
    }

    #[tokio::test]
    async fn default_fixture_returns_salad() {
        let analyzer = FixtureAnalyzer::default();
        let result = analyzer.analyze(image(), Some("lunch")).await.unwrap();
        assert_eq!(result.food_name, "Grilled Chicken Salad");
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(analyzer.last_context().as_deref(), Some("lunch"));
    }

    #[tokio::test]
    async fn fixture_ingredients_add_up() {
        let result = grilled_chicken_salad();
        let totals = result.ingredient_totals();
        let macros = result.macros.unwrap();
        assert_eq!(totals.calories, macros.calories);
        assert!((totals.protein - macros.protein).abs() < 1e-9);
        assert!((totals.carbs - macros.carbs).abs() < 1e-9);
        assert!((totals.fat - macros.fat).abs() < 1e-9);
        assert!((totals.fiber - macros.fiber).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failing_fixture_reports_transport_error() {
        let analyzer = FixtureAnalyzer::failing("upstream exploded");
        let err = analyzer.analyze(image(), None).await.unwrap_err();
        assert!(matches!(err, AdapterFailure::Transport(ref d) if d == "upstream exploded"));
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(analyzer.last_context(), None);
    }

    #[tokio::test]
    async fn not_food_fixture() {
        let analyzer = FixtureAnalyzer::not_food("Laptop computer");
        let result = analyzer.analyze(image(), None).await.unwrap();
        assert!(!result.is_food);
        assert_eq!(result.detected_object, "Laptop computer");
    }
}
