//! Error types for the image asset generator.
//!
//! A unified `thiserror` hierarchy shared by all layers of the server.
//!
//! # Error Categories
//!
//! - `ConfigError`: missing or invalid startup configuration
//! - `ProviderError`: malformed or empty provider responses
//! - `Error::Api`: provider API errors (includes endpoint and status)
//! - `Error::Validation`: tool input validation failures
//! - `Error::Io`: file system operations
//!
//! Everything that crosses the tool boundary is flattened to a human-readable
//! string via `Display`; no structured codes are propagated to callers.

use thiserror::Error;

/// Unified error type for the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing credentials, invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed or empty provider responses
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// API errors with endpoint and HTTP status context
    ///
    /// Includes the API endpoint that failed, HTTP status code, and error
    /// message for debugging and user feedback. Transport-level failures use
    /// status code 0.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Configuration errors.
///
/// These occur when loading configuration from environment variables at
/// startup. They are fatal: the process exits before serving any request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No provider credential is available
    #[error("No provider credential configured. Set GEMINI_API_KEY or OPENAI_API_KEY")]
    NoProviderCredentials,

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Provider response errors.
///
/// These occur when a provider replies with a 2xx status but the body does
/// not carry a usable image payload. Each variant maps to one normalization
/// step in the adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// OpenAI reply carried no base64 payload field
    #[error("No image data received from OpenAI")]
    EmptyResponse,

    /// Gemini reply contained no candidates
    #[error("No candidates in Gemini response")]
    NoCandidates,

    /// Gemini candidate contained no content parts
    #[error("No content parts in Gemini candidate")]
    NoParts,

    /// No Gemini part carried inline binary data
    #[error("No inline image data in Gemini response")]
    NoImageData,

    /// The base64 payload could not be decoded
    #[error("Invalid base64 image payload: {0}")]
    Decode(String),
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
