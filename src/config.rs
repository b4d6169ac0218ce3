use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceProvider {
    Fixture,
    Gemini,
}

impl FromStr for InferenceProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixture" | "fake" | "mock" => Ok(Self::Fixture),
            "gemini" => Ok(Self::Gemini),
            other => anyhow::bail!("unknown inference provider: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub provider: InferenceProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub inference: InferenceConfig,
    pub max_body_bytes: usize,
    pub max_image_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            inference: InferenceConfig {
                provider: InferenceProvider::Fixture,
                gemini_api_key: None,
                gemini_model: "gemini-2.0-flash".into(),
                gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
                timeout: Duration::from_secs(60),
            },
            max_body_bytes: 20 * 1024 * 1024, // 20MB
            max_image_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let provider = match lookup("INFERENCE_PROVIDER") {
            Some(v) => v.parse::<InferenceProvider>().context("INFERENCE_PROVIDER")?,
            None => defaults.inference.provider,
        };
        let inference = InferenceConfig {
            provider,
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.inference.gemini_model),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or(defaults.inference.gemini_base_url),
            timeout: lookup("INFERENCE_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.inference.timeout),
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: match lookup("APP_PORT") {
                Some(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={}", v))?,
                None => defaults.port,
            },
            inference,
            max_body_bytes: lookup("MAX_BODY_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            max_image_bytes: lookup("MAX_IMAGE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_bytes),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_env_gives_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.inference.provider, InferenceProvider::Fixture);
        assert_eq!(cfg.inference.timeout, Duration::from_secs(60));
        assert_eq!(cfg.max_image_bytes, 10 * 1024 * 1024);
        assert!(cfg.inference.gemini_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "9000"),
            ("INFERENCE_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("INFERENCE_TIMEOUT_SECS", "5"),
            ("MAX_IMAGE_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.inference.provider, InferenceProvider::Gemini);
        assert_eq!(cfg.inference.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.inference.gemini_model, "gemini-1.5-pro");
        assert_eq!(cfg.inference.timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_image_bytes, 1024);
    }

    #[test]
    fn rejects_unknown_provider_and_bad_port() {
        assert!(AppConfig::from_lookup(lookup_from(&[("INFERENCE_PROVIDER", "openai")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("APP_PORT", "eighty")])).is_err());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "")])).unwrap();
        assert!(cfg.inference.gemini_api_key.is_none());
    }
}
