//! MCP API Bridge Entry Point
//!
//! Initializes logging, loads configuration and the manifest, and starts the
//! server with the configured transport.
//!
//! Usage: `mcp_api_bridge [MANIFEST_PATH]`

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use mcp_api_bridge::core::config::LogFormat;
use mcp_api_bridge::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let mut config = Config::from_env();
    if let Some(path) = std::env::args().nth(1) {
        config = config.with_manifest_path(path);
    }

    // Initialize logging
    init_logging(&config.logging.level, config.logging.format);

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Create the MCP server
    let server = McpServer::load(&config)
        .with_context(|| format!("loading manifest {}", config.manifest_path.display()))?;

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// `RUST_LOG` directives are honoured on top of the configured level. Output
/// goes to stderr so the stdio transport keeps stdout for protocol frames.
fn init_logging(level: &str, format: LogFormat) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
