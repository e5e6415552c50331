//! Resource service implementation.
//!
//! The ResourceService serves the static resources loaded from the manifest.
//! File and URL sources are read on every access; nothing is cached.

use reqwest::{Client, StatusCode};
use rmcp::model::{ReadResourceResult, Resource, ResourceContents};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use super::definition::{ResourceDefinition, ResourceSource};
use super::error::ResourceError;

/// Deadline for fetching a URL-backed resource.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Service for listing and reading resources.
pub struct ResourceService {
    /// Resources in manifest order.
    resources: Vec<ResourceDefinition>,

    /// Key: resource URI, Value: position in `resources`.
    index: HashMap<String, usize>,

    /// Shared client for URL-backed resources.
    client: Client,

    fetch_timeout: Duration,
}

impl ResourceService {
    /// Create a new ResourceService.
    pub fn new(definitions: Vec<ResourceDefinition>, client: Client) -> Self {
        info!("Initializing ResourceService");

        let mut resources = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            if index.contains_key(&definition.uri) {
                warn!("Duplicate resource URI ignored: {}", definition.uri);
                continue;
            }
            info!("Registering resource: {}", definition.uri);
            index.insert(definition.uri.clone(), resources.len());
            resources.push(definition);
        }

        Self {
            resources,
            index,
            client,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the deadline applied to each URL fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// List all available resources.
    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources
            .iter()
            .map(ResourceDefinition::to_resource)
            .collect()
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let definition = self
            .index
            .get(uri)
            .map(|&i| &self.resources[i])
            .ok_or_else(|| ResourceError::not_found(uri))?;

        info!(uri, "Reading resource");
        let text = match definition.source()? {
            ResourceSource::Inline(content) => content.to_string(),
            ResourceSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ResourceError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?
            }
            ResourceSource::Url(url) => self.fetch(url).await?,
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: definition.uri.clone(),
                mime_type: Some(definition.mime_type.clone()),
                text,
                meta: None,
            }],
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, ResourceError> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| ResourceError::fetch(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(ResourceError::fetch(
                url,
                format!("unexpected status {}", response.status()),
            ));
        }

        response.text().await.map_err(|e| ResourceError::fetch(url, e))
    }
}
