//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport served through rmcp.
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport with JSON-RPC over POST (default).
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Serve Prometheus text on `/metrics`.
    #[serde(default)]
    pub metrics_enabled: bool,

    #[serde(default)]
    pub oauth: OAuthConfig,
}

/// Protected-resource metadata and the bearer presence check.
///
/// Tokens are never verified; enabling this only requires clients to send one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub authorization_servers: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_path() -> String {
    "/mcp".to_string()
}

fn default_cors() -> bool {
    true
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off" | "")
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Http(HttpConfig::default())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            metrics_enabled: false,
            oauth: OAuthConfig::default(),
        }
    }
}

impl HttpConfig {
    /// Socket address string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str| std::env::var(key).ok();

        let port = var("MCP_HTTP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let host = var("MCP_HTTP_HOST").unwrap_or(defaults.host);
        let rpc_path = var("MCP_HTTP_PATH").unwrap_or(defaults.rpc_path);
        let enable_cors = var("MCP_HTTP_CORS")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.enable_cors);
        let metrics_enabled = var("MCP_METRICS_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let oauth = OAuthConfig {
            enabled: var("MCP_OAUTH_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            authorization_servers: var("MCP_OAUTH_AUTHORIZATION_SERVERS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        };

        Self {
            port,
            host,
            rpc_path,
            enable_cors,
            metrics_enabled,
            oauth,
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => Self::Stdio,
            _ => Self::Http(HttpConfig::from_env()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (stdin/stdout)".to_string(),
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    /// Check if this transport is the STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}
