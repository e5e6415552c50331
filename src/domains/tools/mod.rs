//! Tools domain module.
//!
//! Tools are HTTP APIs described declaratively in the manifest. Every tool
//! goes through the same pipeline; there is no per-tool code.
//!
//! ## Architecture
//!
//! - `descriptor.rs` - Tool, parameter, auth and validation descriptors
//! - `template.rs` - `{{.name}}` placeholder expansion
//! - `validator.rs` - Call-time parameter validation and default injection
//! - `request.rs` / `auth.rs` - Outbound request construction
//! - `transport.rs` / `executor.rs` - Sending with retries, backoff and deadline
//! - `response.rs` / `mapper.rs` - Response validation and MCP result mapping
//! - `schema.rs` / `registry.rs` - `tools/list` metadata over the immutable tool set
//! - `service.rs` - The `tools/call` entry point
//! - `error.rs` - Tool-specific error types

pub mod auth;
pub mod descriptor;
mod error;
pub mod executor;
pub mod mapper;
mod registry;
pub mod request;
pub mod response;
pub mod schema;
mod service;
pub mod template;
pub mod transport;
pub mod validator;

pub use descriptor::ToolDescriptor;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use service::{ToolService, redact_arguments};
pub use validator::ParameterError;
