//! MCP API Bridge Library
//!
//! This crate exposes declaratively configured HTTP APIs as Model Context
//! Protocol tools, alongside static prompts and resources.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Configuration, manifest loading, error handling, JSON-RPC dispatch and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: HTTP-backed tools (validation, request building, retries, result mapping)
//!   - **resources**: Static resources read from inline text, files or URLs
//!   - **prompts**: Prompt templates with `{argument}` substitution
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_api_bridge::core::{Config, Manifest, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let manifest = Manifest::load(&config.manifest_path)?;
//!     let server = McpServer::new(&config, manifest)?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, Manifest, McpServer, Result};
