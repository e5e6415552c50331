//! Configuration management for the MCP server.
//!
//! Process-level settings come from `MCP_*` environment variables (a `.env`
//! file is honoured). What the server exposes is declared separately in the
//! manifest, see [`crate::core::manifest`].

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domains::tools::executor::DEFAULT_BACKOFF_UNIT;

/// Default manifest path.
pub const DEFAULT_MANIFEST_PATH: &str = "config.json";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification used when the manifest does not name itself.
    pub server: ServerConfig,

    /// Path to the manifest file.
    pub manifest_path: PathBuf,

    /// Tool execution settings.
    pub tools: ToolsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Settings shared by every tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound on a whole `tools/call`, in seconds. Zero disables it.
    pub call_timeout_secs: u64,

    /// Backoff unit between retries, in milliseconds. Attempt `n` waits `n` units.
    pub retry_backoff_ms: u64,
}

impl ToolsConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 60,
            retry_backoff_ms: DEFAULT_BACKOFF_UNIT.as_millis() as u64,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-api-bridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            tools: ToolsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Text,
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("MCP_LOG_FORMAT") {
            if format.eq_ignore_ascii_case("json") {
                config.logging.format = LogFormat::Json;
            }
        }

        if let Ok(path) = std::env::var("MCP_CONFIG_PATH") {
            if !path.is_empty() {
                config.manifest_path = PathBuf::from(path);
            }
        }

        if let Some(secs) = std::env::var("MCP_TOOL_CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.tools.call_timeout_secs = secs;
        }

        if let Some(ms) = std::env::var("MCP_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.tools.retry_backoff_ms = ms;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config
    }

    /// Override the manifest path, typically from the command line.
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.manifest_path, PathBuf::from("config.json"));
        assert_eq!(config.tools.call_timeout(), Duration::from_secs(60));
        assert_eq!(config.tools.retry_backoff(), Duration::from_secs(1));
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_tools_config_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TOOL_CALL_TIMEOUT_SECS", "5");
            std::env::set_var("MCP_RETRY_BACKOFF_MS", "250");
            std::env::set_var("MCP_LOG_FORMAT", "JSON");
        }
        let config = Config::from_env();
        assert_eq!(config.tools.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.tools.retry_backoff(), Duration::from_millis(250));
        assert_eq!(config.logging.format, LogFormat::Json);
        unsafe {
            std::env::remove_var("MCP_TOOL_CALL_TIMEOUT_SECS");
            std::env::remove_var("MCP_RETRY_BACKOFF_MS");
            std::env::remove_var("MCP_LOG_FORMAT");
        }
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TOOL_CALL_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.tools.call_timeout_secs, 60);
        unsafe {
            std::env::remove_var("MCP_TOOL_CALL_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_manifest_path_override() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_CONFIG_PATH", "/etc/bridge/api.json");
        }
        let config = Config::from_env();
        assert_eq!(config.manifest_path, PathBuf::from("/etc/bridge/api.json"));
        let config = config.with_manifest_path("local.json");
        assert_eq!(config.manifest_path, PathBuf::from("local.json"));
        unsafe {
            std::env::remove_var("MCP_CONFIG_PATH");
        }
    }
}
