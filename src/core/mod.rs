//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server:
//! configuration, manifest loading, error handling, JSON-RPC dispatch,
//! server lifecycle management and the transport layer.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod jsonrpc;
pub mod manifest;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
