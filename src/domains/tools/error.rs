//! Tool-specific error types.

use std::time::Duration;

use thiserror::Error;

use super::template::TemplateError;
use super::validator::ParameterError;

/// Errors that can occur during tool operations.
///
/// Only [`ToolError::NotFound`] and [`ToolError::InvalidParameter`] are
/// request-level failures. Everything else describes a failed upstream call
/// and is reported to the client as tool-level error content.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A call-time argument failed validation.
    #[error("Invalid parameters: {0}")]
    InvalidParameter(#[from] ParameterError),

    /// A template could not be expanded.
    #[error("failed to expand {field}: {source}")]
    Template {
        field: String,
        #[source]
        source: TemplateError,
    },

    /// The expanded endpoint is not a valid URL.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A header name or value is not valid HTTP.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// An authentication scheme has no usable credential.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Every attempt failed at the network level.
    #[error("request failed after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    /// The call deadline elapsed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The final response broke a validation rule.
    #[error("response validation failed: {0}")]
    ResponseValidation(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new template expansion error for the given request part.
    pub fn template(field: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            field: field.into(),
            source,
        }
    }

    /// Create a new "invalid URL" error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new "missing credential" error.
    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Create a new response validation error.
    pub fn response_validation(msg: impl Into<String>) -> Self {
        Self::ResponseValidation(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error rejects the protocol request itself rather than
    /// reporting a failed upstream call.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidParameter(_))
    }
}
