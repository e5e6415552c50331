//! Tool service implementation.
//!
//! One generic invocation path serves every configured tool:
//! validate -> build/execute with retries -> process response -> map result.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rmcp::model::{CallToolResult, Tool};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::auth::ProcessEnv;
use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::executor::{RetryingExecutor, TokioSleeper};
use super::mapper::{map_failure, map_outcome};
use super::registry::ToolRegistry;
use super::response::{ApiOutcome, process_response};
use super::transport::ReqwestTransport;
use super::validator::validate_arguments;
use crate::core::config::ToolsConfig;

/// Replacement text for sensitive argument values in logs.
pub const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "api_key", "secret", "auth"];

/// Service for listing and calling HTTP-backed tools.
pub struct ToolService {
    registry: Arc<ToolRegistry>,
    executor: RetryingExecutor,
    call_timeout: Option<Duration>,
}

impl ToolService {
    /// Create a service over an existing registry and executor.
    ///
    /// A zero `call_timeout` leaves `tools/call` unbounded apart from the
    /// per-tool deadlines.
    pub fn new(
        registry: Arc<ToolRegistry>,
        executor: RetryingExecutor,
        call_timeout: Duration,
    ) -> Self {
        info!("Initializing ToolService with {} tools", registry.len());
        Self {
            registry,
            executor,
            call_timeout: (!call_timeout.is_zero()).then_some(call_timeout),
        }
    }

    /// Create the production service: pooled `reqwest` transport, tokio
    /// timer and process environment for credentials.
    pub fn with_client(tools: Vec<ToolDescriptor>, client: Client, config: &ToolsConfig) -> Self {
        let executor = RetryingExecutor::new(
            Arc::new(ReqwestTransport::new(client)),
            Arc::new(TokioSleeper),
            Arc::new(ProcessEnv),
            config.retry_backoff(),
        );
        Self::new(
            Arc::new(ToolRegistry::new(tools)),
            executor,
            config.call_timeout(),
        )
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// List all configured tools.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.list_tools()
    }

    /// Call a tool by name.
    ///
    /// Returns `Err` only for request-level failures (unknown tool, invalid
    /// arguments). Upstream failures come back as an `isError` result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self.registry.get(name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            ToolError::not_found(name)
        })?;

        let mut args = arguments.unwrap_or_default();
        let redacted = Value::Object(redact_arguments(&args));
        info!(
            tool = name,
            arguments = %redacted,
            "Processing tools/call request"
        );

        validate_arguments(tool, &mut args).inspect_err(|e| {
            warn!(tool = name, "Rejected tool arguments: {}", e);
        })?;

        let outcome = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(tool, &args))
                .await
                .unwrap_or_else(|_| Err(ToolError::Timeout(limit))),
            None => self.run(tool, &args).await,
        };

        Ok(match outcome {
            Ok(outcome) => map_outcome(tool, &outcome),
            Err(e) => map_failure(tool, &e),
        })
    }

    async fn run(
        &self,
        tool: &ToolDescriptor,
        args: &Map<String, Value>,
    ) -> Result<ApiOutcome, ToolError> {
        let raw = self.executor.execute(tool, args).await?;
        process_response(tool, raw)
    }
}

/// Copy of `args` with sensitive values replaced, for logging.
///
/// A key is sensitive when it contains one of the known markers,
/// case-insensitively. Nested objects are redacted too.
pub fn redact_arguments(args: &Map<String, Value>) -> Map<String, Value> {
    args.iter()
        .map(|(key, value)| {
            let lowered = key.to_ascii_lowercase();
            let value = if SENSITIVE_KEYS.iter().any(|marker| lowered.contains(marker)) {
                Value::String(REDACTED.to_string())
            } else if let Value::Object(nested) = value {
                Value::Object(redact_arguments(nested))
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
