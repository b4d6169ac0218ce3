//! Boundary to the image-understanding engine.
//!
//! The scan handler only sees [`FoodAnalyzer`]. Which implementation sits
//! behind it is decided once, from configuration, in [`create_analyzer`].

mod fixture;
mod gemini;
pub mod prompt;

pub use fixture::FixtureAnalyzer;
#[cfg(test)]
pub use fixture::grilled_chicken_salad;
pub use gemini::GeminiAnalyzer;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::{InferenceConfig, InferenceProvider};
use crate::nutrition::types::ScanResult;

/// Why an analysis produced no usable result. Never shown to the caller.
#[derive(Debug, Error)]
pub enum AdapterFailure {
    #[error("inference request failed: {0}")]
    Transport(String),

    #[error("inference engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("inference result malformed: {0}")]
    Malformed(String),

    #[error("inference call cancelled before completion")]
    Cancelled,
}

/// Image to analyze plus the sniffed media type.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Bytes,
    pub mime_type: &'static str,
}

#[async_trait]
pub trait FoodAnalyzer: Send + Sync {
    /// Analyze one image. `context` is the caller's free-text description, if any.
    async fn analyze(
        &self,
        image: ImageInput,
        context: Option<&str>,
    ) -> Result<ScanResult, AdapterFailure>;

    fn provider_name(&self) -> &'static str;
}

pub fn create_analyzer(cfg: &InferenceConfig) -> anyhow::Result<Box<dyn FoodAnalyzer>> {
    match cfg.provider {
        InferenceProvider::Fixture => Ok(Box::new(FixtureAnalyzer::default())),
        InferenceProvider::Gemini => {
            let api_key = cfg
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY not set"))?;
            Ok(Box::new(GeminiAnalyzer::new(
                api_key,
                cfg.gemini_model.clone(),
                cfg.gemini_base_url.clone(),
            )?))
        }
    }
}

/// Best-effort media type from magic bytes; JPEG when unknown.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [_, _, _, _, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c', ..] => "image/heic",
        _ => "image/jpeg",
    }
}
