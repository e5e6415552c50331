//! HTTP transport implementation.
//!
//! HTTP server with JSON-RPC over POST requests.
//! This allows standard HTTP clients (curl, browsers, etc.) to communicate with the MCP server.
//!
//! Every JSON-RPC outcome, including errors, is sent with status 200. Only the
//! optional bearer check answers with a transport-level 401.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::dispatcher::dispatch;
use crate::core::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// Path of the protected-resource metadata document.
pub const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";

const CORS_MAX_AGE_SECS: u64 = 86400;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    /// The MCP server instance.
    server: McpServer,
    config: Arc<HttpConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Run the HTTP transport until Ctrl-C or SIGTERM.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");
        if self.config.metrics_enabled {
            info!("  → Metrics:  GET /metrics");
        }
        if self.config.oauth.enabled {
            info!("  → OAuth:    GET {}", PROTECTED_RESOURCE_PATH);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

/// Build the axum router for `server`.
pub fn router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        server,
        config: Arc::new(config.clone()),
    };

    let mut rpc = post(handle_rpc)
        .options(handle_preflight)
        .fallback(handle_wrong_method);
    if config.oauth.enabled {
        rpc = rpc.route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));
    }
    let rpc_routes = Router::new().route(&config.rpc_path, rpc);

    let mut aux_routes = Router::new()
        .route("/health", get(health_check))
        .route("/", get(root_handler));
    if config.metrics_enabled {
        aux_routes = aux_routes.route("/metrics", get(metrics));
    }
    if config.oauth.enabled {
        aux_routes = aux_routes.route(PROTECTED_RESOURCE_PATH, get(protected_resource_metadata));
    }
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
        aux_routes = aux_routes.layer(cors);
    }

    Router::new()
        .merge(rpc_routes)
        .merge(aux_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

// ============================================================================
// JSON-RPC endpoint
// ============================================================================

/// Wrap a JSON-RPC reply, adding the endpoint's CORS headers when enabled.
fn rpc_reply(config: &HttpConfig, status: StatusCode, body: Option<JsonRpcResponse>) -> Response {
    let mut response = match body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    };

    if config.enable_cors {
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(CORS_MAX_AGE_SECS));
    }
    response
}

/// Handle JSON-RPC requests.
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rejected unparseable JSON-RPC body: {}", e);
            let reply = JsonRpcResponse::parse_error(e.to_string());
            return rpc_reply(&state.config, StatusCode::OK, Some(reply));
        }
    };

    let id = value.get("id").cloned();
    let response = match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => {
            info!("Received JSON-RPC request: {}", request.method);
            dispatch(&state.server, request).await
        }
        Err(e) => JsonRpcResponse::invalid_request(id, e.to_string()),
    };

    rpc_reply(&state.config, StatusCode::OK, Some(response))
}

/// CORS preflight for the JSON-RPC endpoint.
async fn handle_preflight(State(state): State<AppState>) -> Response {
    rpc_reply(&state.config, StatusCode::NO_CONTENT, None)
}

async fn handle_wrong_method(State(state): State<AppState>, method: Method) -> Response {
    debug!("Rejected {} on the JSON-RPC endpoint", method);
    let reply = JsonRpcResponse::invalid_request(None, "Only POST method is allowed");
    rpc_reply(&state.config, StatusCode::OK, Some(reply))
}

// ============================================================================
// OAuth protected-resource stub
// ============================================================================

/// Scheme and host the client used to reach us.
fn base_url(headers: &HeaderMap, config: &HttpConfig) -> String {
    let scheme = if headers.contains_key("x-forwarded-proto") {
        "https"
    } else {
        "http"
    };
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("localhost:{}", config.port));
    format!("{}://{}", scheme, host)
}

/// Require an `Authorization: Bearer` header. The token itself is not verified.
async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let has_bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.len() > 7 && v[..7].eq_ignore_ascii_case("bearer "));
    if has_bearer {
        return next.run(request).await;
    }

    warn!("Rejected request without bearer token");
    let metadata_url = format!(
        "{}{}",
        base_url(request.headers(), &state.config),
        PROTECTED_RESOURCE_PATH
    );
    let challenge = format!(
        "Bearer, error=\"invalid_token\", error_description=\"Missing bearer token\", resource_metadata=\"{}\"",
        metadata_url
    );

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

async fn protected_resource_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let resource = format!("{}{}", base_url(&headers, &state.config), state.config.rpc_path);
    Json(json!({
        "resource": resource,
        "authorization_servers": state.config.oauth.authorization_servers
    }))
}

// ============================================================================
// Auxiliary endpoints
// ============================================================================

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut endpoints = json!({
        "rpc": state.config.rpc_path,
        "health": "/health"
    });
    if state.config.metrics_enabled {
        endpoints["metrics"] = json!("/metrics");
    }

    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "description": state.server.description(),
        "transport": "HTTP",
        "endpoints": endpoints,
        "protocol": "JSON-RPC 2.0",
        "documentation": format!("Send POST requests to {} with JSON-RPC messages", state.config.rpc_path)
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let server = &state.server;
    Json(json!({
        "status": "healthy",
        "server_name": server.name(),
        "version": server.version(),
        "tools_count": server.tools().registry().len(),
        "prompts_count": server.prompts().len(),
        "resources_count": server.resources().len(),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }))
}

/// Prometheus text exposition of static server facts.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let server = &state.server;
    let body = format!(
        "# HELP mcp_server_info Server information\n\
         # TYPE mcp_server_info gauge\n\
         mcp_server_info{{name=\"{}\",version=\"{}\"}} 1\n\
         # HELP mcp_tools_count Number of registered tools\n\
         # TYPE mcp_tools_count gauge\n\
         mcp_tools_count {}\n\
         # HELP mcp_prompts_count Number of registered prompts\n\
         # TYPE mcp_prompts_count gauge\n\
         mcp_prompts_count {}\n\
         # HELP mcp_resources_count Number of registered resources\n\
         # TYPE mcp_resources_count gauge\n\
         mcp_resources_count {}\n",
        server.name(),
        server.version(),
        server.tools().registry().len(),
        server.prompts().len(),
        server.resources().len(),
    );

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
