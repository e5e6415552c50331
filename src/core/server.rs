//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to domain-specific services. The HTTP transport
//! reaches the same services through [`crate::core::dispatcher`]; the stdio
//! transport goes through the `ServerHandler` implementation below.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::config::Config;
use super::error::{Error, Result};
use super::manifest::Manifest;
use crate::domains::{
    prompts::{PromptError, PromptService},
    resources::ResourceService,
    tools::{ToolError, ToolService},
};

/// Protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Instructions announced by `initialize`.
pub const INSTRUCTIONS: &str = "MCP Server ready for tool, prompt, and resource operations";

/// The main MCP server handler.
///
/// Cheap to clone: every service sits behind an `Arc` and is immutable after
/// construction, so concurrent requests share it without locking.
#[derive(Clone)]
pub struct McpServer {
    name: Arc<str>,
    version: Arc<str>,
    description: Arc<str>,

    /// Service for handling tool-related requests.
    tool_service: Arc<ToolService>,

    /// Service for handling prompt-related requests.
    prompt_service: Arc<PromptService>,

    /// Service for handling resource-related requests.
    resource_service: Arc<ResourceService>,
}

impl McpServer {
    /// Create a server from process configuration and a loaded manifest.
    ///
    /// One pooled HTTP client is shared by every tool and URL resource.
    pub fn new(config: &Config, manifest: Manifest) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {}", e)))?;

        let name = if manifest.server.name.is_empty() {
            config.server.name.clone()
        } else {
            manifest.server.name
        };

        let server = Self::from_services(
            name,
            manifest.server.version,
            ToolService::with_client(manifest.tools, client.clone(), &config.tools),
            PromptService::new(manifest.prompts),
            ResourceService::new(manifest.resources, client),
        );
        Ok(Self {
            description: manifest.server.description.into(),
            ..server
        })
    }

    /// Load the manifest named by `config` and build the server from it.
    pub fn load(config: &Config) -> Result<Self> {
        let manifest = Manifest::load(&config.manifest_path)?;
        Self::new(config, manifest)
    }

    /// Assemble a server from already-built services.
    pub fn from_services(
        name: impl Into<String>,
        version: impl Into<String>,
        tools: ToolService,
        prompts: PromptService,
        resources: ResourceService,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        info!(
            "Server {} v{} ready with {} tools, {} prompts, {} resources",
            name,
            version,
            tools.registry().len(),
            prompts.len(),
            resources.len()
        );
        Self {
            name: name.into(),
            version: version.into(),
            description: Arc::from(""),
            tool_service: Arc::new(tools),
            prompt_service: Arc::new(prompts),
            resource_service: Arc::new(resources),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Free-form description from the manifest, empty when absent.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tools(&self) -> &ToolService {
        &self.tool_service
    }

    pub fn prompts(&self) -> &PromptService {
        &self.prompt_service
    }

    pub fn resources(&self) -> &ResourceService {
        &self.resource_service
    }
}

/// Request-level tool errors become JSON-RPC errors; nothing else reaches here.
fn tool_error_to_mcp(error: ToolError) -> McpError {
    if error.is_request_error() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

fn prompt_error_to_mcp(error: PromptError) -> McpError {
    McpError::invalid_params(error.to_string(), None)
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: self.name.to_string(),
                version: self.version.to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tool_service.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.tool_service
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(tool_error_to_mcp)
    }

    #[instrument(skip(self, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        Ok(ListResourcesResult {
            resources: self.resource_service.list_resources(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, McpError> {
        info!("Reading resource: {}", request.uri);
        self.resource_service
            .read_resource(&request.uri)
            .await
            .map_err(|e| McpError::resource_not_found(e.to_string(), None))
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        Ok(ListPromptsResult {
            prompts: self.prompt_service.list_prompts(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        let arguments = request.arguments.map(|map| {
            map.into_iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                .collect()
        });
        self.prompt_service
            .get_prompt(&request.name, arguments)
            .map_err(prompt_error_to_mcp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::PromptTemplateBuilder;
    use crate::domains::resources::ResourceDefinition;
    use crate::domains::tools::ToolDescriptor;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::default();
        manifest.tools.push(ToolDescriptor::new(
            "get_item",
            "Fetch an item",
            "https://api.example.com/items",
        ));
        manifest
            .prompts
            .push(PromptTemplateBuilder::new("hello").content("Hi").build());
        manifest
            .resources
            .push(ResourceDefinition::inline("docs://a", "A", "text"));
        manifest
    }

    #[test]
    fn test_name_falls_back_to_config() {
        let server = McpServer::new(&Config::default(), manifest()).unwrap();
        assert_eq!(server.name(), "mcp-api-bridge");
        assert_eq!(server.version(), "1.0.0");
        assert_eq!(server.tools().registry().len(), 1);
        assert_eq!(server.prompts().len(), 1);
        assert_eq!(server.resources().len(), 1);
    }

    #[test]
    fn test_manifest_name_wins() {
        let mut manifest = manifest();
        manifest.server.name = "weather-bridge".into();
        let server = McpServer::new(&Config::default(), manifest).unwrap();
        assert_eq!(server.name(), "weather-bridge");

        let info = server.get_info();
        assert_eq!(info.server_info.name, "weather-bridge");
        assert_eq!(info.instructions.as_deref(), Some(INSTRUCTIONS));
    }

    #[test]
    fn test_load_reads_manifest_from_config_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(
            &path,
            r#"{"server": {"name": "file-bridge", "description": "Items API"},
                "tools": [{"name": "t", "description": "d", "endpoint": "https://api.example.com"}]}"#,
        )
        .unwrap();

        let config = Config::default().with_manifest_path(&path);
        let server = McpServer::load(&config).unwrap();
        assert_eq!(server.name(), "file-bridge");
        assert_eq!(server.description(), "Items API");
        assert_eq!(server.tools().registry().len(), 1);
    }

    #[test]
    fn test_load_missing_manifest_is_manifest_error() {
        let config = Config::default().with_manifest_path("/nonexistent/bridge.json");
        let err = McpServer::load(&config).err().unwrap();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn test_tool_error_mapping() {
        let err = tool_error_to_mcp(ToolError::not_found("nope"));
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }
}
