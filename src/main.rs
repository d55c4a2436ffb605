//! Image Asset Generator MCP Server
//!
//! MCP server for text-to-image generation using OpenAI DALL-E or Google
//! Gemini, saving results as local PNG files.

use anyhow::Result;
use clap::Parser;
use image_asset_generator::{provider, Config, ImageGenServer, McpServerBuilder, TransportArgs};

/// Command-line arguments for the image server.
#[derive(Parser, Debug)]
#[command(name = "image-asset-generator")]
#[command(about = "MCP server for text-to-image generation")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("image-asset-generator server starting...");

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration; missing credentials are fatal before any tool
    // call is served.
    let config = Config::from_env()?;
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        "Configuration loaded"
    );

    // Select the provider once for the process lifetime
    let provider = provider::from_config(&config);
    let server = ImageGenServer::new(provider);

    // Build and run the MCP server
    let transport = args.transport.into_transport();
    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
