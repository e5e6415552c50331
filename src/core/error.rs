//! Error types and handling for the MCP server.
//!
//! Domain services report their own error types; this type covers what can
//! fail while starting the server (manifest, HTTP client, transport).

use thiserror::Error;

use super::manifest::ManifestError;
use super::transport::TransportError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// The manifest could not be loaded.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The transport failed to start or stopped with an error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
