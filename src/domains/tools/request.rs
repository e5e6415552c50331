//! Request Builder: descriptor + arguments -> outbound HTTP request.
//!
//! Build order matters:
//! 1. endpoint template, then URL parse
//! 2. query (URL query, configured templates, then GET pass-through of
//!    declared parameters not already consumed by the endpoint path)
//! 3. body
//! 4. default headers, content type, configured headers, authentication

use std::collections::BTreeMap;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde_json::{Map, Value};

use super::auth::{EnvSource, apply_auth, header_name};
use super::descriptor::{HttpMethod, ToolDescriptor};
use super::error::ToolError;
use super::template::{expand, referenced_keys, render_value};

/// User agent sent with every upstream request.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Accept header sent unless a configured header replaces it.
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Content type used for bodies when the descriptor names none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// A fully expanded upstream request. Built fresh for every attempt.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Build the outbound request for one attempt.
///
/// Fails before any network I/O on template, URL, header or credential errors.
pub fn build_request(
    tool: &ToolDescriptor,
    args: &Map<String, Value>,
    env: &dyn EnvSource,
) -> Result<OutboundRequest, ToolError> {
    let endpoint = expand(&tool.endpoint, args).map_err(|e| ToolError::template("endpoint", e))?;
    let mut url = Url::parse(&endpoint).map_err(|e| ToolError::invalid_url(endpoint.to_string(), e))?;

    let query = merge_query(tool, &url, args)?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, values) in &query {
            for value in values {
                pairs.append_pair(name, value);
            }
        }
    }

    let body = build_body(tool, args)?;
    let headers = build_headers(tool, args, body.is_some(), env)?;

    Ok(OutboundRequest {
        method: tool.method.to_reqwest(),
        url,
        headers,
        body,
    })
}

/// Query values keyed by name, sorted, with a later write replacing earlier ones.
fn merge_query(
    tool: &ToolDescriptor,
    url: &Url,
    args: &Map<String, Value>,
) -> Result<BTreeMap<String, Vec<String>>, ToolError> {
    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        query
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    for (name, template) in &tool.query_params {
        let value = expand(template, args)
            .map_err(|e| ToolError::template(format!("query parameter '{}'", name), e))?;
        query.insert(name.clone(), vec![value.into_owned()]);
    }

    if tool.method == HttpMethod::Get {
        let in_path = referenced_keys(&tool.endpoint);
        for param in &tool.parameters {
            if in_path.contains(&param.name.as_str()) {
                continue;
            }
            if let Some(value) = args.get(&param.name) {
                query.insert(param.name.clone(), vec![render_value(value)]);
            }
        }
    }

    Ok(query)
}

fn build_body(tool: &ToolDescriptor, args: &Map<String, Value>) -> Result<Option<String>, ToolError> {
    if tool.method == HttpMethod::Get {
        return Ok(None);
    }

    match tool.body_template.as_deref().filter(|t| !t.is_empty()) {
        Some(template) => {
            let body = expand(template, args).map_err(|e| ToolError::template("body", e))?;
            Ok(Some(body.into_owned()))
        }
        None if !args.is_empty() => serde_json::to_string(args)
            .map(Some)
            .map_err(|e| ToolError::internal(e.to_string())),
        None => Ok(None),
    }
}

fn build_headers(
    tool: &ToolDescriptor,
    args: &Map<String, Value>,
    has_body: bool,
    env: &dyn EnvSource,
) -> Result<HeaderMap, ToolError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

    if has_body {
        let content_type = tool.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        headers.insert(CONTENT_TYPE, header_value(content_type, "Content-Type")?);
    }

    for (name, template) in &tool.headers {
        let value = expand(template, args)
            .map_err(|e| ToolError::template(format!("header '{}'", name), e))?;
        headers.insert(header_name(name)?, header_value(&value, name)?);
    }

    if let Some(auth) = &tool.auth {
        apply_auth(auth, &mut headers, env)?;
    }

    Ok(headers)
}

fn header_value(value: &str, name: &str) -> Result<HeaderValue, ToolError> {
    HeaderValue::from_str(value).map_err(|_| ToolError::InvalidHeader(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::descriptor::{AuthDescriptor, ParameterDescriptor, ParameterKind};
    use reqwest::header::AUTHORIZATION;
    use serde_json::json;
    use std::collections::HashMap;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn get_item_tool() -> ToolDescriptor {
        let mut tool = ToolDescriptor::new(
            "get_item",
            "Fetch an item",
            "https://api.example.com/items/{{.id}}",
        );
        tool.parameters = vec![ParameterDescriptor::new("id", ParameterKind::String, true)];
        tool
    }

    #[test]
    fn test_get_expands_endpoint_without_body() {
        let tool = get_item_tool();
        let req = build_request(&tool, &args(json!({ "id": "42" })), &no_env()).unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url.as_str(), "https://api.example.com/items/42");
        assert!(req.body.is_none());
        assert_eq!(req.headers[ACCEPT], DEFAULT_ACCEPT);
        assert_eq!(req.headers[USER_AGENT], DEFAULT_USER_AGENT);
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_get_passes_declared_parameters_as_query() {
        let mut tool = ToolDescriptor::new("search", "d", "https://api.example.com/search?v=1");
        tool.parameters = vec![
            ParameterDescriptor::new("q", ParameterKind::String, true),
            ParameterDescriptor::new("limit", ParameterKind::Number, false),
        ];
        tool.query_params
            .insert("q".to_string(), "configured".to_string());

        let a = args(json!({ "q": "rust lang", "limit": 5, "undeclared": "x" }));
        let req = build_request(&tool, &a, &no_env()).unwrap();

        // declared parameters overwrite configured query templates of the same name
        assert_eq!(
            req.url.as_str(),
            "https://api.example.com/search?limit=5&q=rust+lang&v=1"
        );
    }

    #[test]
    fn test_post_defaults_to_json_body() {
        let mut tool = ToolDescriptor::new("create", "d", "https://api.example.com/items");
        tool.method = HttpMethod::Post;
        let req = build_request(&tool, &args(json!({ "name": "widget" })), &no_env()).unwrap();

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"widget"}"#));
        assert_eq!(req.headers[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_post_without_arguments_has_no_body() {
        let mut tool = ToolDescriptor::new("ping", "d", "https://api.example.com/ping");
        tool.method = HttpMethod::Post;
        let req = build_request(&tool, &Map::new(), &no_env()).unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn test_body_template_used_verbatim() {
        let mut tool = ToolDescriptor::new("create", "d", "https://api.example.com/items");
        tool.method = HttpMethod::Put;
        tool.body_template = Some(r#"<item name="{{.name}}"/>"#.to_string());
        tool.content_type = Some("application/xml".to_string());

        let req = build_request(&tool, &args(json!({ "name": "w" })), &no_env()).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"<item name="w"/>"#));
        assert_eq!(req.headers[CONTENT_TYPE], "application/xml");
    }

    #[test]
    fn test_body_template_ignored_for_get() {
        let mut tool = ToolDescriptor::new("t", "d", "https://api.example.com");
        tool.body_template = Some("{{.x}}".to_string());
        let req = build_request(&tool, &args(json!({ "x": 1 })), &no_env()).unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn test_configured_headers_override_defaults() {
        let mut tool = ToolDescriptor::new("t", "d", "https://api.example.com");
        tool.headers
            .insert("Accept".to_string(), "text/csv".to_string());
        tool.headers
            .insert("X-Trace".to_string(), "{{.trace}}".to_string());

        let req = build_request(&tool, &args(json!({ "trace": "abc" })), &no_env()).unwrap();
        assert_eq!(req.headers[ACCEPT], "text/csv");
        assert_eq!(req.headers["x-trace"], "abc");
    }

    #[test]
    fn test_auth_applied_last() {
        let mut tool = ToolDescriptor::new("t", "d", "https://api.example.com");
        tool.headers
            .insert("Authorization".to_string(), "Bearer configured".to_string());
        tool.auth = Some(AuthDescriptor::Bearer {
            token: None,
            env_var: Some("TOKEN".into()),
        });

        let env = HashMap::from([("TOKEN".to_string(), "abc123".to_string())]);
        let req = build_request(&tool, &Map::new(), &env).unwrap();
        assert_eq!(req.headers[AUTHORIZATION], "Bearer abc123");
    }

    #[test]
    fn test_missing_argument_aborts_build() {
        let err = build_request(&get_item_tool(), &Map::new(), &no_env()).unwrap_err();
        assert!(matches!(err, ToolError::Template { .. }));
    }

    #[test]
    fn test_invalid_url_aborts_build() {
        let tool = ToolDescriptor::new("t", "d", "{{.base}}/items");
        let err = build_request(&tool, &args(json!({ "base": "not a url" })), &no_env())
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidUrl { .. }));
    }
}
