//! Resources domain module.
//!
//! Resources are static documents declared in the manifest. Their text comes
//! from inline content, a local file or a remote URL.
//!
//! ## Architecture
//!
//! - `definition.rs` - Resource model and content source selection
//! - `service.rs` - Resource service for listing and reading
//! - `error.rs` - Resource-specific error types

mod definition;
mod error;
mod service;

pub use definition::{ResourceDefinition, ResourceSource};
pub use error::ResourceError;
pub use service::ResourceService;
