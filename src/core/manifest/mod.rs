//! Manifest loading.
//!
//! The manifest is a JSON file declaring the server identity and the tools,
//! prompts and resources it exposes. Loading happens once at startup:
//!
//! 1. `${VAR}` placeholders are substituted from the environment
//! 2. the text is deserialized (field defaults come from serde)
//! 3. load-time defaults are applied
//! 4. structural rules are validated
//!
//! Everything downstream trusts the result and never re-checks structure.

pub mod duration;
mod env;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domains::prompts::PromptTemplate;
use crate::domains::resources::ResourceDefinition;
use crate::domains::tools::ToolDescriptor;
use crate::domains::tools::auth::{EnvSource, ProcessEnv};
use crate::domains::tools::descriptor::{AuthDescriptor, MAX_RETRIES};
use crate::domains::tools::request::DEFAULT_CONTENT_TYPE;

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    Invalid(String),
}

impl ManifestError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Server identity as declared in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: default_version(),
            description: String::new(),
        }
    }
}

/// The parsed and validated manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub server: ServerInfo,

    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,

    #[serde(default)]
    pub prompts: Vec<PromptTemplate>,

    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

impl Manifest {
    /// Load a manifest file, resolving placeholders from the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        info!("Loading manifest from {:?}", path);

        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&text, &ProcessEnv)
    }

    /// Parse manifest text, resolving placeholders from `env`.
    pub fn from_json_str(text: &str, env: &dyn EnvSource) -> Result<Self, ManifestError> {
        let substituted = env::substitute(text, env);
        let mut manifest: Manifest = serde_json::from_str(&substituted)?;

        manifest.apply_defaults();
        manifest.validate()?;

        info!(
            tools = manifest.tools.len(),
            prompts = manifest.prompts.len(),
            resources = manifest.resources.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    fn apply_defaults(&mut self) {
        for tool in &mut self.tools {
            let missing = tool.content_type.as_deref().is_none_or(str::is_empty);
            if tool.method.sends_body_by_default() && missing {
                debug!(tool = %tool.name, "Defaulting content type");
                tool.content_type = Some(DEFAULT_CONTENT_TYPE.to_string());
            }
        }
    }

    /// Check the structural rules every loaded manifest must satisfy.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut tool_names = HashSet::new();
        for tool in &self.tools {
            validate_tool(tool)?;
            if !tool_names.insert(tool.name.as_str()) {
                return Err(ManifestError::invalid(format!(
                    "duplicate tool name: {}",
                    tool.name
                )));
            }
        }

        let mut prompt_names = HashSet::new();
        for prompt in &self.prompts {
            if prompt.name.is_empty() {
                return Err(ManifestError::invalid("prompt name is required"));
            }
            if !prompt_names.insert(prompt.name.as_str()) {
                return Err(ManifestError::invalid(format!(
                    "duplicate prompt name: {}",
                    prompt.name
                )));
            }
        }

        let mut resource_uris = HashSet::new();
        for resource in &self.resources {
            if resource.uri.is_empty() {
                return Err(ManifestError::invalid("resource uri is required"));
            }
            if !resource_uris.insert(resource.uri.as_str()) {
                return Err(ManifestError::invalid(format!(
                    "duplicate resource URI: {}",
                    resource.uri
                )));
            }
            resource
                .source()
                .map_err(|e| ManifestError::invalid(e.to_string()))?;
        }

        Ok(())
    }
}

fn validate_tool(tool: &ToolDescriptor) -> Result<(), ManifestError> {
    let invalid = |reason: String| ManifestError::invalid(format!("tool '{}': {}", tool.name, reason));

    if tool.name.is_empty() {
        return Err(ManifestError::invalid("tool name is required"));
    }
    if !(tool.endpoint.starts_with("http://") || tool.endpoint.starts_with("https://")) {
        return Err(invalid(format!(
            "endpoint must start with http:// or https://, got '{}'",
            tool.endpoint
        )));
    }
    if tool.retries > MAX_RETRIES {
        return Err(invalid(format!(
            "retries must be between 0 and {}, got {}",
            MAX_RETRIES, tool.retries
        )));
    }

    for param in &tool.parameters {
        if param.name.is_empty() {
            return Err(invalid("parameter name is required".to_string()));
        }
        if let Some(pattern) = param.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
            Regex::new(pattern).map_err(|e| {
                invalid(format!("parameter '{}' has invalid pattern: {}", param.name, e))
            })?;
        }
    }

    if let Some(auth) = &tool.auth {
        validate_auth(auth).map_err(|reason| invalid(reason.to_string()))?;
    }

    Ok(())
}

fn validate_auth(auth: &AuthDescriptor) -> Result<(), &'static str> {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    match auth {
        AuthDescriptor::Bearer { token, env_var } => {
            if !present(token) && !present(env_var) {
                return Err("bearer auth requires token or env_var");
            }
        }
        AuthDescriptor::Basic {
            username,
            password,
            env_var,
        } => {
            if username.is_empty() {
                return Err("basic auth requires username");
            }
            if !present(password) && !present(env_var) {
                return Err("basic auth requires password or env_var");
            }
        }
        AuthDescriptor::ApiKey { headers, env_var } => {
            if headers.is_empty() && !present(env_var) {
                return Err("api_key auth requires headers or env_var");
            }
        }
        AuthDescriptor::Custom { headers } => {
            if headers.is_empty() {
                return Err("custom auth requires headers");
            }
        }
    }
    Ok(())
}
