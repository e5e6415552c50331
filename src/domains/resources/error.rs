//! Resource-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The requested resource was not found.
    #[error("Resource '{0}' not found")]
    NotFound(String),

    /// The resource does not declare exactly one content source.
    #[error("Resource '{0}' must declare exactly one of content, file_path or url")]
    InvalidSource(String),

    /// An I/O error occurred while reading a file-backed resource.
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A URL-backed resource could not be fetched.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

impl ResourceError {
    /// Create a new "not found" error.
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound(uri.into())
    }

    /// Create a new "invalid source" error.
    pub fn invalid_source(uri: impl Into<String>) -> Self {
        Self::InvalidSource(uri.into())
    }

    /// Create a new fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
