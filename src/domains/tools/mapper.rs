//! Result Mapper: outcomes become MCP tool results.
//!
//! Upstream failures are reported as `isError` content, never as protocol
//! errors, so the calling assistant can read them and decide what to do.

use rmcp::model::{CallToolResult, Content};
use tracing::warn;

use super::descriptor::{ReturnType, ToolDescriptor};
use super::error::ToolError;
use super::response::ApiOutcome;

/// Map a processed upstream response.
pub fn map_outcome(tool: &ToolDescriptor, outcome: &ApiOutcome) -> CallToolResult {
    if outcome.is_error_status() {
        return error_result(
            tool,
            &format!("HTTP Error {}: {}", outcome.status, outcome.body),
        );
    }

    CallToolResult::success(vec![Content::text(format_body(tool, outcome))])
}

/// Map a call that never produced a usable response.
pub fn map_failure(tool: &ToolDescriptor, error: &ToolError) -> CallToolResult {
    error_result(tool, &error.to_string())
}

fn error_result(tool: &ToolDescriptor, detail: &str) -> CallToolResult {
    let message = format!("{} {} failed: {}", tool.method, tool.endpoint, detail);
    warn!(tool = %tool.name, "{}", message);
    CallToolResult::error(vec![Content::text(message)])
}

fn format_body(tool: &ToolDescriptor, outcome: &ApiOutcome) -> String {
    if tool.return_type == Some(ReturnType::String) {
        return outcome.body.clone();
    }

    outcome
        .data
        .as_ref()
        .and_then(|data| serde_json::to_string_pretty(data).ok())
        .unwrap_or_else(|| outcome.body.clone())
}
