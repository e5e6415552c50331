//! End-to-end `tools/call` scenarios: JSON-RPC over the axum router against a
//! local upstream API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    routing::get,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio_test::assert_ok;
use tower::ServiceExt;

use mcp_api_bridge::core::transport::HttpConfig;
use mcp_api_bridge::core::transport::http::router;
use mcp_api_bridge::core::{Config, Manifest, McpServer};

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

async fn get_item(
    State(upstream): State<Upstream>,
    Path(id): Path<String>,
    uri: Uri,
) -> Json<Value> {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    assert!(uri.query().is_none(), "unexpected query: {:?}", uri.query());
    Json(json!({"id": id, "name": "widget"}))
}

async fn always_fail(State(upstream): State<Upstream>) -> (StatusCode, &'static str) {
    upstream.failures.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({"authorization": authorization}))
}

async fn search(uri: Uri) -> Json<Value> {
    Json(json!({"query": uri.query().unwrap_or_default()}))
}

async fn spawn_upstream() -> (SocketAddr, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/items/{id}", get(get_item))
        .route("/fail", get(always_fail))
        .route("/whoami", get(whoami))
        .route("/search", get(search))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, upstream)
}

static TOKEN_ENV: Once = Once::new();

/// Set process environment once, before any test builds an HTTP client.
fn init_env() {
    TOKEN_ENV.call_once(|| unsafe {
        std::env::set_var("BRIDGE_IT_TOKEN", "abc123");
    });
}

fn bridge(addr: SocketAddr) -> Router {
    init_env();
    let manifest_text = r#"{
        "server": {"name": "it-bridge", "version": "0.9.0"},
        "tools": [
            {
                "name": "get_item",
                "description": "Fetch one item",
                "endpoint": "${UPSTREAM}/items/{{.id}}",
                "method": "GET",
                "return_type": "object",
                "parameters": [{"name": "id", "type": "string", "required": true}]
            },
            {
                "name": "flaky",
                "description": "Always fails upstream",
                "endpoint": "${UPSTREAM}/fail",
                "retries": 2
            },
            {
                "name": "whoami",
                "description": "Echo the Authorization header",
                "endpoint": "${UPSTREAM}/whoami",
                "auth": {"type": "bearer", "env_var": "BRIDGE_IT_TOKEN"}
            },
            {
                "name": "search",
                "description": "Search with a default limit",
                "endpoint": "${UPSTREAM}/search",
                "parameters": [
                    {"name": "q", "type": "string", "required": true},
                    {"name": "limit", "type": "number", "default": 10}
                ]
            }
        ]
    }"#;

    let env = HashMap::from([("UPSTREAM".to_string(), format!("http://{}", addr))]);
    let manifest = assert_ok!(Manifest::from_json_str(manifest_text, &env));

    let mut config = Config::default();
    config.tools.retry_backoff_ms = 1;
    let server = assert_ok!(McpServer::new(&config, manifest));
    router(server, &HttpConfig::default())
}

async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    let request = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn result_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn get_item_returns_pretty_json() {
    let (addr, upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let response = rpc(
        &app,
        "tools/call",
        json!({"name": "get_item", "arguments": {"id": "42"}}),
    )
    .await;

    assert!(response.get("error").is_none(), "{}", response);
    assert_eq!(response["result"]["isError"], false);

    let expected = json!({"id": "42", "name": "widget"});
    let text = result_text(&response);
    assert_eq!(text, serde_json::to_string_pretty(&expected).unwrap());
    assert_eq!(serde_json::from_str::<Value>(text).unwrap(), expected);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_required_parameter_is_invalid_params() {
    let (addr, upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let response = rpc(&app, "tools/call", json!({"name": "get_item", "arguments": {}})).await;

    assert_eq!(response["error"]["code"], -32602);
    assert!(response["error"]["message"].as_str().unwrap().contains("id"));
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_retries_report_tool_error() {
    let (addr, upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let response = rpc(&app, "tools/call", json!({"name": "flaky"})).await;

    assert!(response.get("error").is_none(), "{}", response);
    assert_eq!(response["result"]["isError"], true);
    let text = result_text(&response);
    assert!(text.contains("500"), "{}", text);
    assert!(text.contains(&format!("http://{}/fail", addr)), "{}", text);
    assert_eq!(upstream.failures.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn bearer_token_comes_from_environment() {
    let (addr, _upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let response = rpc(&app, "tools/call", json!({"name": "whoami"})).await;

    let body: Value = serde_json::from_str(result_text(&response)).unwrap();
    assert_eq!(body["authorization"], "Bearer abc123");
}

#[tokio::test]
async fn defaults_reach_the_query_string() {
    let (addr, _upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let response = rpc(
        &app,
        "tools/call",
        json!({"name": "search", "arguments": {"q": "rust"}}),
    )
    .await;

    let body: Value = serde_json::from_str(result_text(&response)).unwrap();
    assert_eq!(body["query"], "limit=10&q=rust");
}

#[tokio::test]
async fn tools_list_describes_parameters() {
    let (addr, _upstream) = spawn_upstream().await;
    let app = bridge(addr);

    let first = rpc(&app, "tools/list", json!({})).await;
    let second = rpc(&app, "tools/list", json!({})).await;
    assert_eq!(first, second);

    let tools = first["result"]["tools"].as_array().unwrap();
    let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["get_item", "flaky", "whoami", "search"]);

    let search = &tools[3]["inputSchema"];
    assert_eq!(search["type"], "object");
    assert_eq!(search["required"], json!(["q"]));
    assert_eq!(search["properties"]["limit"]["type"], "number");
}
