//! JSON-RPC method routing for the HTTP transport.
//!
//! Every request is routed purely by its method name; no state is kept
//! between requests. Method-level failures become JSON-RPC error objects,
//! while upstream API failures come back inside a successful `tools/call`
//! result with `isError: true`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use super::jsonrpc::{JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse};
use super::server::{INSTRUCTIONS, McpServer, PROTOCOL_VERSION};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: String,
    #[serde(default)]
    client_info: ClientInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ClientInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// Decode `params`; a missing or malformed object is an invalid-params error.
fn parse_params<T: DeserializeOwned>(
    request: &JsonRpcRequest,
) -> std::result::Result<T, JsonRpcResponse> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| JsonRpcResponse::invalid_params(request.id.clone(), "Missing params"))?;
    serde_json::from_value(params).map_err(|e| {
        JsonRpcResponse::invalid_params(request.id.clone(), format!("Invalid params: {}", e))
    })
}

/// Process a JSON-RPC request and return the response.
#[instrument(skip_all, fields(method = %request.method))]
pub async fn dispatch(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    if request.jsonrpc != JSONRPC_VERSION {
        return JsonRpcResponse::invalid_request(
            request.id,
            format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
        );
    }

    debug!(id = ?request.id, "Handling JSON-RPC request");

    match request.method.as_str() {
        "initialize" => handle_initialize(server, request),
        "initialized" => {
            info!("MCP client initialized");
            JsonRpcResponse::success(request.id, json!({}))
        }
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(server, request),
        "tools/call" => handle_tools_call(server, request).await,
        "prompts/list" => handle_prompts_list(server, request),
        "prompts/get" => handle_prompts_get(server, request),
        "resources/list" => handle_resources_list(server, request),
        "resources/read" => handle_resources_read(server, request).await,
        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            JsonRpcResponse::success(request.id, json!({}))
        }
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id, &request.method)
        }
    }
}

/// Handle initialize request.
fn handle_initialize(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let params: InitializeParams = request
        .params
        .clone()
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default();

    info!(
        client_name = %params.client_info.name,
        client_version = %params.client_info.version,
        protocol_version = %params.protocol_version,
        "MCP client initializing"
    );

    let result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {"listChanged": true},
            "prompts": {"listChanged": true},
            "resources": {"listChanged": true}
        },
        "serverInfo": {
            "name": server.name(),
            "version": server.version()
        },
        "instructions": INSTRUCTIONS
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Listing available tools");

    let tools: Vec<Value> = server
        .tools()
        .list_tools()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema
            })
        })
        .collect();

    JsonRpcResponse::success(request.id, json!({ "tools": tools }))
}

/// Handle tools/call request.
async fn handle_tools_call(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let params: CallToolParams = match parse_params(&request) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match server.tools().call_tool(&params.name, params.arguments).await {
        Ok(result) => JsonRpcResponse::success(
            request.id,
            json!({
                "content": result.content,
                "isError": result.is_error.unwrap_or(false)
            }),
        ),
        Err(e) if e.is_request_error() => JsonRpcResponse::invalid_params(request.id, e.to_string()),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

/// Handle prompts/list request.
fn handle_prompts_list(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Listing available prompts");

    let prompts: Vec<Value> = server
        .prompts()
        .list_prompts()
        .into_iter()
        .map(|p| {
            json!({
                "name": p.name,
                "description": p.description,
                "arguments": p.arguments
            })
        })
        .collect();

    JsonRpcResponse::success(request.id, json!({ "prompts": prompts }))
}

/// Handle prompts/get request.
fn handle_prompts_get(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let params: GetPromptParams = match parse_params(&request) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let arguments: Option<HashMap<String, String>> = params.arguments.map(|map| {
        map.into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect()
    });

    match server.prompts().get_prompt(&params.name, arguments) {
        Ok(result) => JsonRpcResponse::success(
            request.id,
            json!({
                "description": result.description,
                "messages": result.messages
            }),
        ),
        Err(e) => JsonRpcResponse::invalid_params(request.id, e.to_string()),
    }
}

/// Handle resources/list request.
fn handle_resources_list(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Listing available resources");

    let resources: Vec<Value> = server
        .resources()
        .list_resources()
        .into_iter()
        .map(|r| {
            json!({
                "uri": r.raw.uri,
                "name": r.raw.name,
                "description": r.raw.description,
                "mimeType": r.raw.mime_type
            })
        })
        .collect();

    JsonRpcResponse::success(request.id, json!({ "resources": resources }))
}

/// Handle resources/read request.
async fn handle_resources_read(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let params: ReadResourceParams = match parse_params(&request) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match server.resources().read_resource(&params.uri).await {
        Ok(result) => JsonRpcResponse::success(request.id, json!({ "contents": result.contents })),
        Err(e) => JsonRpcResponse::invalid_params(request.id, e.to_string()),
    }
}
