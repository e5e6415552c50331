//! Transport service - picks the configured transport and runs it.

use tracing::info;

use super::TransportConfig;
use crate::core::{McpServer, Result};

use super::http::HttpTransport;
#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Start the transport with the given MCP server.
    ///
    /// This method blocks until the transport is shut down.
    pub async fn run(self, server: McpServer) -> Result<()> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(server).await?,
            TransportConfig::Http(cfg) => HttpTransport::new(cfg).run(server).await?,
        }
        Ok(())
    }
}
