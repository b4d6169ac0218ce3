use crate::config::AppConfig;
use crate::inference::{create_analyzer, FoodAnalyzer};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analyzer: Arc<dyn FoodAnalyzer>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let analyzer: Arc<dyn FoodAnalyzer> = Arc::from(create_analyzer(&config.inference)?);

        tracing::info!(
            provider = analyzer.provider_name(),
            timeout_secs = config.inference.timeout.as_secs(),
            "inference adapter ready"
        );

        Ok(Self::from_parts(config, analyzer))
    }

    pub fn from_parts(config: Arc<AppConfig>, analyzer: Arc<dyn FoodAnalyzer>) -> Self {
        Self { config, analyzer }
    }

    /// Default config plus the given analyzer; for tests.
    #[cfg(test)]
    pub fn fake(analyzer: Arc<dyn FoodAnalyzer>) -> Self {
        Self::from_parts(Arc::new(AppConfig::default()), analyzer)
    }
}
