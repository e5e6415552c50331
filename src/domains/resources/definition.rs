//! Resource definitions as declared in the manifest.

use rmcp::model::{AnnotateAble, RawResource, Resource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ResourceError;

fn default_mime_type() -> String {
    "text/plain".to_string()
}

/// A static resource. Exactly one of `content`, `file_path` or `url` must be
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub uri: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Inline content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// File read on every access; relative paths resolve against the
    /// working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// URL fetched with GET on every access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Where a resource's text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSource<'a> {
    Inline(&'a str),
    File(&'a Path),
    Url(&'a str),
}

impl ResourceDefinition {
    /// Create an inline text resource.
    pub fn inline(
        uri: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: String::new(),
            mime_type: default_mime_type(),
            content: Some(content.into()),
            file_path: None,
            url: None,
        }
    }

    /// The single content source of this resource.
    pub fn source(&self) -> Result<ResourceSource<'_>, ResourceError> {
        match (&self.content, &self.file_path, &self.url) {
            (Some(content), None, None) => Ok(ResourceSource::Inline(content)),
            (None, Some(path), None) => Ok(ResourceSource::File(path)),
            (None, None, Some(url)) => Ok(ResourceSource::Url(url)),
            _ => Err(ResourceError::invalid_source(&self.uri)),
        }
    }

    /// MCP resource metadata.
    pub fn to_resource(&self) -> Resource {
        let mut raw = RawResource::new(self.uri.clone(), self.name.clone());
        raw.description = Some(self.description.clone());
        raw.mime_type = Some(self.mime_type.clone());
        raw.no_annotation()
    }
}
