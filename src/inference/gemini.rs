use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{prompt, AdapterFailure, FoodAnalyzer, ImageInput};
use crate::nutrition::types::ScanResult;

/// Live analyzer backed by the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiAnalyzer {
    api_key: String,
    model_name: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model_name: String, base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("macroguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            api_key,
            model_name,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }

    fn build_request(image: &ImageInput, context: Option<&str>) -> GeminiRequest {
        GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt::SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: general_purpose::STANDARD.encode(&image.bytes),
                        },
                    },
                    Part::Text {
                        text: prompt::user_prompt(context),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: prompt::scan_result_schema(),
            },
        }
    }

    async fn call_gemini_api(&self, request: GeminiRequest) -> Result<String, AdapterFailure> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "gemini request failed");
                AdapterFailure::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, body = %message, "gemini returned error");
            return Err(AdapterFailure::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdapterFailure::Transport(e.to_string()))?;
        extract_text(&body)
    }
}

/// First text part of the first candidate.
fn extract_text(body: &str) -> Result<String, AdapterFailure> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| AdapterFailure::Malformed(format!("gemini envelope: {}", e)))?;

    parsed
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| AdapterFailure::Malformed("no text candidate in gemini response".into()))
}

/// Parses model JSON into a [`ScanResult`], tolerating a surrounding code fence.
fn parse_scan_result(text: &str) -> Result<ScanResult, AdapterFailure> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(json.trim())
        .map_err(|e| AdapterFailure::Malformed(format!("scan result: {}", e)))
}

#[async_trait]
impl FoodAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        image: ImageInput,
        context: Option<&str>,
    ) -> Result<ScanResult, AdapterFailure> {
        let request = Self::build_request(&image, context);
        let text = self.call_gemini_api(request).await?;
        debug!(model = %self.model_name, chars = text.len(), "gemini answered");
        parse_scan_result(&text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn image() -> ImageInput {
        ImageInput {
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            mime_type: "image/png",
        }
    }

    #[test]
    fn request_carries_image_prompt_and_schema() {
        let request = GeminiAnalyzer::build_request(&image(), Some("lunch"));
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(
            parts[0]["inline_data"]["data"],
            general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\n")
        );
        assert!(parts[1]["text"].as_str().unwrap().contains("Additional context: lunch"));
        assert!(json["system_instruction"].get("role").is_none());
        assert_eq!(json["generation_config"]["response_mime_type"], "application/json");
        assert_eq!(json["generation_config"]["response_schema"]["type"], "OBJECT");
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let analyzer = GeminiAnalyzer::new(
            "key".into(),
            "gemini-2.0-flash".into(),
            "https://example.test/v1beta/".into(),
        )
        .unwrap();
        assert_eq!(
            analyzer.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extracts_first_text_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"is_food\":false}"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), r#"{"is_food":false}"#);
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let err = extract_text(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, AdapterFailure::Malformed(_)));
        let err = extract_text("not json").unwrap_err();
        assert!(matches!(err, AdapterFailure::Malformed(_)));
    }

    #[test]
    fn parses_scan_result_with_and_without_fence() {
        let raw = r#"{"is_food":true,"detected_object":"soup","food_name":"Tomato soup","confidence":0.7,
            "serving_size":"1 bowl","macros":{"calories":180,"protein":4.0,"carbs":30.0,"fat":5.0,"fiber":3.0},
            "ingredients":[{"name":"tomato","weight_grams":250.0,"macros":{"calories":45,"protein":2.0,"carbs":10.0,"fat":0.5,"fiber":3.0}}]}"#;
        let plain = parse_scan_result(raw).unwrap();
        let fenced = parse_scan_result(&format!("```json\n{}\n```", raw)).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(plain.food_name, "Tomato soup");
        assert_eq!(plain.ingredients.len(), 1);
        assert_eq!(plain.macros.unwrap().calories, 180);
    }

    #[test]
    fn rejects_garbage_scan_result() {
        assert!(matches!(
            parse_scan_result("I think it is a sandwich"),
            Err(AdapterFailure::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_failure() {
        let analyzer = GeminiAnalyzer::new(
            "key".into(),
            "gemini-2.0-flash".into(),
            "http://127.0.0.1:1".into(),
        )
        .unwrap();
        let err = analyzer.analyze(image(), None).await.unwrap_err();
        assert!(matches!(err, AdapterFailure::Transport(_)));
    }
}
