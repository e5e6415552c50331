//! Declarative tool descriptors.
//!
//! A [`ToolDescriptor`] is everything needed to turn a `tools/call` into an
//! outbound HTTP request: endpoint and body templates, headers, declared
//! parameters, authentication, retry/timeout policy and response rules.
//! Descriptors are deserialized from the manifest and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::manifest::duration;

/// Default per-call deadline when the manifest does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry count when the manifest does not set one.
pub const DEFAULT_RETRIES: u32 = 3;

/// Upper bound for the retry count.
pub const MAX_RETRIES: u32 = 5;

/// One callable HTTP-backed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,

    /// Human readable description shown in `tools/list`.
    pub description: String,

    /// Endpoint URL template, e.g. `https://api.example.com/items/{{.id}}`.
    pub endpoint: String,

    /// HTTP method.
    #[serde(default)]
    pub method: HttpMethod,

    /// Header templates applied after the default headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query parameter templates.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,

    /// Body template for non-GET requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,

    /// Content type sent with a request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Declared parameters, in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,

    /// How a successful response is rendered back to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,

    /// Deadline for the whole call including retries. Zero disables it.
    #[serde(default = "default_timeout", with = "duration")]
    pub timeout: Duration,

    /// Additional attempts after the first one.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Optional upstream authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthDescriptor>,

    /// Optional response validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ResponseValidation>,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl ToolDescriptor {
    /// Create a GET descriptor with default policy and no parameters.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            query_params: BTreeMap::new(),
            body_template: None,
            content_type: None,
            parameters: Vec::new(),
            return_type: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            auth: None,
            validation: None,
        }
    }

    /// Whether a status code counts as a successful attempt.
    ///
    /// An explicit allow-list wins; otherwise any 2xx status succeeds.
    pub fn is_success_status(&self, status: u16) -> bool {
        match &self.validation {
            Some(rules) if !rules.status_codes.is_empty() => rules.status_codes.contains(&status),
            _ => (200..300).contains(&status),
        }
    }

    /// The deadline for the whole call, if any.
    pub fn deadline(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}

/// Supported upstream HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Methods that carry a JSON body by default.
    pub fn sends_body_by_default(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Convert to the HTTP client's method type.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ParameterKind,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    /// Injected into the arguments when the parameter is optional and absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ParameterValidation>,
}

impl ParameterDescriptor {
    /// Create a parameter with no constraints.
    pub fn new(name: impl Into<String>, kind: ParameterKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required,
            default: None,
            validation: None,
        }
    }
}

/// The closed set of parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    #[default]
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParameterKind {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional constraints on a parameter value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

/// Declared shape of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Upstream authentication.
///
/// Explicit values come first; a non-empty environment variable named by
/// `env_var` overrides them at request time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDescriptor {
    Bearer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        env_var: Option<String>,
    },
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        env_var: Option<String>,
    },
    ApiKey {
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        env_var: Option<String>,
    },
    Custom {
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl AuthDescriptor {
    /// Name of the scheme as written in the manifest.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "api_key",
            Self::Custom { .. } => "custom",
        }
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl fmt::Debug for AuthDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { token, env_var } => f
                .debug_struct("Bearer")
                .field("token", &token.as_ref().map(|_| "[REDACTED]"))
                .field("env_var", env_var)
                .finish(),
            Self::Basic {
                username,
                password,
                env_var,
            } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "[REDACTED]"))
                .field("env_var", env_var)
                .finish(),
            Self::ApiKey { headers, env_var } => f
                .debug_struct("ApiKey")
                .field("headers", &headers.keys().collect::<Vec<_>>())
                .field("env_var", env_var)
                .finish(),
            Self::Custom { headers } => f
                .debug_struct("Custom")
                .field("headers", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Rules applied to the final upstream response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseValidation {
    /// Allowed status codes. Empty means "any 2xx".
    #[serde(default)]
    pub status_codes: Vec<u16>,

    /// Top-level fields the JSON payload must contain.
    #[serde(default)]
    pub required_fields: Vec<String>,
}
