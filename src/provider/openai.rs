//! OpenAI DALL-E provider adapter.
//!
//! Issues one image-generation call requesting exactly one 1024x1024 image as
//! a base64 payload and decodes it to raw bytes.

use crate::error::{Error, ProviderError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::ImageProvider;

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Requested image size.
const IMAGE_SIZE: &str = "1024x1024";

/// Image generation via the OpenAI images API.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new adapter against the real OpenAI API.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, OPENAI_API_BASE.to_string())
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

    /// Get the images API endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(level = "info", name = "openai_generate", skip_all, fields(model = %self.model))]
    async fn generate(&self, description: &str) -> Result<Vec<u8>, Error> {
        let request = ImagesRequest {
            model: self.model.clone(),
            prompt: description.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
            response_format: "b64_json".to_string(),
        };

        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, "Calling OpenAI images API");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::api(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(&endpoint, status.as_u16(), body));
        }

        let api_response: ImagesResponse = response.json().await.map_err(|e| {
            Error::api(&endpoint, status.as_u16(), format!("Failed to parse response: {}", e))
        })?;

        let payload = api_response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or(ProviderError::EmptyResponse)?;

        let bytes = BASE64
            .decode(&payload)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        debug!(bytes = bytes.len(), "Decoded image from OpenAI");
        Ok(bytes)
    }
}

/// OpenAI images API request.
#[derive(Debug, Serialize)]
struct ImagesRequest {
    /// Model identifier (e.g. "dall-e-3")
    model: String,
    /// Text prompt describing the image
    prompt: String,
    /// Number of images to generate
    n: u8,
    /// Image dimensions
    size: String,
    /// Response encoding
    response_format: String,
}

/// OpenAI images API response.
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    /// Generated images
    #[serde(default)]
    data: Vec<ImageData>,
}

/// One generated image in the response.
#[derive(Debug, Deserialize)]
struct ImageData {
    /// Base64-encoded image payload
    b64_json: Option<String>,
}
