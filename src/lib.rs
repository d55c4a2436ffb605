//! Image Asset Generator MCP Server Library
//!
//! Exposes text-to-image generation as MCP tools, backed by OpenAI DALL-E or
//! Google Gemini, writing PNG results to local files.

pub mod batch;
pub mod config;
pub mod error;
pub mod provider;
pub mod serve;
pub mod server;
pub mod storage;
pub mod transport;

pub use batch::{BatchRequest, BatchResult, ImageRequest, ImageResult};
pub use config::{Config, ProviderKind};
pub use error::{ConfigError, Error, ProviderError, Result};
pub use provider::ImageProvider;
pub use serve::{shutdown_channel, McpServerBuilder, ServerError};
pub use server::ImageGenServer;
pub use transport::{Transport, TransportArgs, TransportMode};
