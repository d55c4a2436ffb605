//! Provider adapters for the backing image-generation APIs.
//!
//! Each adapter translates a single text description into one provider call
//! and normalizes the reply to raw PNG bytes or a typed failure. Exactly one
//! outbound network call per invocation; no retries, no timeout override
//! beyond the transport default.

pub mod gemini;
pub mod openai;

use crate::config::{Config, ProviderKind};
use crate::error::Error;
use async_trait::async_trait;
use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// A backing image-generation provider.
///
/// Implementations never panic across this boundary; every failure mode is
/// returned as an `Error` value for the orchestrator to record per item.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Short provider name for logging.
    fn name(&self) -> &'static str;

    /// Generate one image from a free-text description.
    ///
    /// Returns the decoded image bytes on success.
    async fn generate(&self, description: &str) -> Result<Vec<u8>, Error>;
}

/// Build the process-wide provider from the startup configuration.
///
/// The selection is made once here and held immutable for the process
/// lifetime; no request may override it.
pub fn from_config(config: &Config) -> Arc<dyn ImageProvider> {
    match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            config.api_key.clone(),
            config.model.clone(),
        )),
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            config.api_key.clone(),
            config.model.clone(),
        )),
    }
}
