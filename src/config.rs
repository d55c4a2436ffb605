//! Configuration module for loading environment variables and settings.
//!
//! Provider selection happens exactly once, at startup: a Gemini credential
//! takes priority over an OpenAI credential when both are set, and the absence
//! of both is fatal. No request may override the selection afterwards.

use crate::error::ConfigError;

/// Default OpenAI image model.
pub const DEFAULT_OPENAI_MODEL: &str = "dall-e-3";

/// Default Gemini image model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

/// The backing provider selected for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Google Gemini multimodal generation
    Gemini,
    /// OpenAI DALL-E image generation
    OpenAi,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected provider (immutable for the process lifetime)
    pub provider: ProviderKind,
    /// API key for the selected provider
    pub api_key: String,
    /// Model identifier for the selected provider
    pub model: String,
    /// HTTP server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::NoProviderCredentials` if neither GEMINI_API_KEY
    /// nor OPENAI_API_KEY is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::resolve(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("GEMINI_IMAGE_MODEL").ok(),
            std::env::var("OPENAI_IMAGE_MODEL").ok(),
            std::env::var("PORT").ok(),
        )
    }

    /// Resolve a configuration from already-read variable values.
    ///
    /// Gemini wins when both credentials are present.
    fn resolve(
        gemini_key: Option<String>,
        openai_key: Option<String>,
        gemini_model: Option<String>,
        openai_model: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = match port {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::invalid_value("PORT", format!("not a port number: {p}")))?,
            None => 8080,
        };

        let (provider, api_key, model) = if let Some(key) = gemini_key.filter(|k| !k.is_empty()) {
            (
                ProviderKind::Gemini,
                key,
                gemini_model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            )
        } else if let Some(key) = openai_key.filter(|k| !k.is_empty()) {
            (
                ProviderKind::OpenAi,
                key,
                openai_model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            )
        } else {
            return Err(ConfigError::NoProviderCredentials);
        };

        Ok(Self {
            provider,
            api_key,
            model,
            port,
        })
    }
}
