//! Prompts domain module.
//!
//! Prompts are static message templates declared in the manifest. Clients
//! list them and fetch them with `{argument}` placeholders filled in.
//!
//! ## Architecture
//!
//! - `templates.rs` - Prompt template model and rendering
//! - `service.rs` - Prompt service for listing and rendering
//! - `error.rs` - Prompt-specific error types

mod error;
mod service;
pub mod templates;

pub use error::PromptError;
pub use service::PromptService;
pub use templates::{PromptArgumentSpec, PromptTemplate, PromptTemplateBuilder};
