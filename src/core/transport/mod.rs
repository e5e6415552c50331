//! Transport layer for the MCP server.
//!
//! - **HTTP**: JSON-RPC over POST plus health, metrics and OAuth discovery
//!   endpoints. Always built; the default at runtime.
//! - **STDIO**: stdin/stdout through rmcp - feature: `stdio` (default)
//!
//! Both delegate message processing to the same [`McpServer`](crate::core::McpServer).

mod config;
mod error;
mod service;

pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::{HttpConfig, OAuthConfig, TransportConfig};
pub use error::{TransportError, TransportResult};
pub use service::TransportService;
