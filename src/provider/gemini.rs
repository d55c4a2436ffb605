//! Google Gemini provider adapter.
//!
//! Issues one multimodal generation call requesting mixed text and image
//! output and extracts the first inline-data part of the reply.

use crate::error::{Error, ProviderError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::ImageProvider;

/// Default Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Fixed sampling temperature for image generation.
const TEMPERATURE: f32 = 1.0;

/// Image generation via the Gemini generateContent API.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new adapter against the real Gemini API.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, GEMINI_API_BASE.to_string())
    }

    /// Create a new adapter against an alternate base URL (used in tests).
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    /// Get the generateContent endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Wrap a description in the fixed generation prompt.
    fn build_prompt(description: &str) -> String {
        format!(
            "Generate an image based on the following description: {}. \
             Output format should be suitable for saving as a PNG file.",
            description
        )
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(level = "info", name = "gemini_generate", skip_all, fields(model = %self.model))]
    async fn generate(&self, description: &str) -> Result<Vec<u8>, Error> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: Self::build_prompt(description),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        };

        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, "Calling Gemini generateContent API");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::api(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(&endpoint, status.as_u16(), body));
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            Error::api(&endpoint, status.as_u16(), format!("Failed to parse response: {}", e))
        })?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::NoCandidates)?;

        let parts = candidate
            .content
            .map(|c| c.parts)
            .filter(|p| !p.is_empty())
            .ok_or(ProviderError::NoParts)?;

        let payload = parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or(ProviderError::NoImageData)?;

        let bytes = BASE64
            .decode(&payload.data)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        debug!(bytes = bytes.len(), "Decoded image from Gemini");
        Ok(bytes)
    }
}

/// Gemini generateContent request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

/// One content block of the request.
#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

/// A text part of the request prompt.
#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

/// Generation tuning for the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_modalities: Vec<String>,
}

/// Gemini generateContent response.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One candidate of the response.
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

/// Content of a response candidate.
#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// One part of a candidate; image parts carry inline data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

/// Inline binary payload of an image part.
#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 1x1 transparent PNG
    const TINY_PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::with_base_url(
            "test-key".to_string(),
            "gemini-2.0-flash-exp-image-generation".to_string(),
            server.uri(),
        )
    }

    fn image_response() -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image."},
                        {"inlineData": {"mimeType": "image/png", "data": TINY_PNG_B64}}
                    ]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_generate_extracts_inline_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1beta/models/gemini-2.0-flash-exp-image-generation:generateContent",
            ))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "temperature": 1.0,
                    "responseModalities": ["TEXT", "IMAGE"]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_response()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = provider(&server).generate("a red square").await.unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_prompt_wraps_description_in_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{
                    "parts": [{
                        "text": "Generate an image based on the following description: \
                                 a red square. Output format should be suitable for \
                                 saving as a PNG file."
                    }]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_response()))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).generate("a red square").await.unwrap();
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = provider(&server).generate("a cat").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_candidate_without_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": []}}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate("a cat").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NoParts)));
    }

    #[tokio::test]
    async fn test_parts_without_inline_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "I cannot draw that."}]}}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate("a cat").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NoImageData)));
    }

    #[tokio::test]
    async fn test_http_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
            .mount(&server)
            .await;

        let err = provider(&server).generate("a cat").await.unwrap_err();
        match err {
            Error::Api {
                status_code,
                message,
                ..
            } => {
                assert_eq!(status_code, 403);
                assert!(message.contains("API key invalid"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: "prompt".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["temperature"], 1.0);
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
    }

    #[test]
    fn test_response_deserialization_skips_text_parts() {
        let response: GenerateContentResponse =
            serde_json::from_value(image_response()).unwrap();
        let parts = response.candidates[0].content.as_ref().unwrap();
        assert_eq!(parts.parts.len(), 2);
        assert!(parts.parts[0].inline_data.is_none());
        assert!(parts.parts[1].inline_data.is_some());
    }
}
