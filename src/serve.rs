//! MCP server runner.
//!
//! Builds and runs the MCP service over the configured transport with
//! graceful shutdown on SIGTERM/SIGINT or a programmatic channel.
//!
//! # Example
//!
//! ```ignore
//! use image_asset_generator::serve::McpServerBuilder;
//! use image_asset_generator::transport::Transport;
//!
//! McpServerBuilder::new(server)
//!     .with_transport(Transport::stdio())
//!     .run()
//!     .await?;
//! ```

use crate::transport::Transport;
use rmcp::{ServerHandler, ServiceExt};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors that can occur when running an MCP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified port
    #[error("Failed to bind to port {port}: {message}")]
    BindFailed { port: u16, message: String },

    /// Transport error during communication
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring and running the MCP server.
pub struct McpServerBuilder<H> {
    handler: H,
    transport: Transport,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Create a new server builder with the given handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            transport: Transport::default(),
            shutdown_rx: None,
        }
    }

    /// Set the transport mode for the server.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set a shutdown signal receiver for graceful shutdown.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Run the MCP server with the configured transport.
    ///
    /// Blocks until the server is shut down via signal or shutdown channel.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        match self.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http { port } => self.run_http(port).await,
        }
    }

    async fn run_stdio(self) -> Result<(), ServerError> {
        use rmcp::transport::io::stdio;

        let shutdown_future = async {
            if let Some(rx) = self.shutdown_rx {
                let _ = rx.await;
            } else {
                wait_for_shutdown_signal().await;
            }
        };

        let service = self
            .handler
            .serve(stdio())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tokio::select! {
            result = service.waiting() => {
                result.map_err(|e| ServerError::Transport(e.to_string()))?;
                Ok(())
            }
            _ = shutdown_future => {
                tracing::info!("Received shutdown signal, stopping server");
                Ok(())
            }
        }
    }

    async fn run_http(self, port: u16) -> Result<(), ServerError> {
        use rmcp::transport::streamable_http_server::{
            session::local::LocalSessionManager, StreamableHttpService,
        };

        let handler = self.handler.clone();
        let service = StreamableHttpService::new(
            move || Ok(handler.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let router = axum::Router::new().nest_service("/mcp", service);

        let bind_addr = format!("0.0.0.0:{}", port);
        let tcp_listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServerError::BindFailed {
                port,
                message: e.to_string(),
            })?;

        tracing::info!(port, "HTTP server listening");

        let shutdown_future = async {
            if let Some(rx) = self.shutdown_rx {
                let _ = rx.await;
            } else {
                wait_for_shutdown_signal().await;
            }
        };

        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(shutdown_future)
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        tracing::info!("Received Ctrl+C");
    }
}

/// Create a channel for triggering shutdown programmatically.
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::provider::ImageProvider;
    use crate::server::ImageGenServer;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct StubProvider;

    #[async_trait]
    impl ImageProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate(&self, _description: &str) -> Result<Vec<u8>, Error> {
            Ok(b"png".to_vec())
        }
    }

    fn test_server() -> ImageGenServer {
        ImageGenServer::new(Arc::new(StubProvider))
    }

    #[test]
    fn test_server_error_bind_failed_display() {
        let err = ServerError::BindFailed {
            port: 8080,
            message: "Address already in use".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("8080"), "Should contain port number");
        assert!(
            msg.contains("Address already in use"),
            "Should contain error message"
        );
    }

    #[test]
    fn test_server_error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ServerError = io_err.into();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[tokio::test]
    async fn test_shutdown_channel_delivers_signal() {
        let (tx, rx) = shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        assert!(rx.await.is_ok(), "Should receive shutdown signal");
    }

    #[tokio::test]
    async fn test_http_run_returns_cleanly_on_shutdown_signal() {
        let (tx, rx) = shutdown_channel();

        // Port 0 asks the OS for an ephemeral port.
        let handle = tokio::spawn(
            McpServerBuilder::new(test_server())
                .with_transport(Transport::http(0))
                .with_shutdown(rx)
                .run(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).expect("Server should still be waiting on the channel");

        let result = handle.await.unwrap();
        assert!(result.is_ok(), "Shutdown should be clean: {:?}", result);
    }

    #[tokio::test]
    async fn test_http_bind_failure_is_reported() {
        let listener = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = McpServerBuilder::new(test_server())
            .with_transport(Transport::http(port))
            .run()
            .await;

        match result {
            Err(ServerError::BindFailed { port: reported, .. }) => {
                assert_eq!(reported, port)
            }
            other => panic!("Expected BindFailed, got {:?}", other),
        }
    }
}
