//! Upstream authentication.
//!
//! Credentials are resolved at request time: the explicit value from the
//! descriptor is taken first, then a non-empty environment variable named by
//! `env_var` overrides it. Resolved secrets are marked sensitive on the header
//! value and never logged.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use super::descriptor::AuthDescriptor;
use super::error::ToolError;

/// Header used when an `api_key` scheme names only an environment variable.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Read-only lookup of credential values by variable name.
///
/// Empty values are treated the same as unset ones.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

/// Inject the credentials described by `auth` into `headers`.
///
/// Runs after configured headers, so authentication always wins.
pub fn apply_auth(
    auth: &AuthDescriptor,
    headers: &mut HeaderMap,
    env: &dyn EnvSource,
) -> Result<(), ToolError> {
    match auth {
        AuthDescriptor::Bearer { token, env_var } => {
            let token = resolve(token.as_deref(), env_var.as_deref(), env)
                .ok_or_else(|| ToolError::missing_credential("bearer token"))?;
            headers.insert(AUTHORIZATION, secret_value(&format!("Bearer {}", token))?);
        }
        AuthDescriptor::Basic {
            username,
            password,
            env_var,
        } => {
            let password = resolve(password.as_deref(), env_var.as_deref(), env)
                .ok_or_else(|| ToolError::missing_credential("basic auth password"))?;
            let encoded = STANDARD.encode(format!("{}:{}", username, password));
            headers.insert(AUTHORIZATION, secret_value(&format!("Basic {}", encoded))?);
        }
        AuthDescriptor::ApiKey {
            headers: keyed,
            env_var,
        } => {
            let from_env = env_var.as_deref().and_then(|name| env.var(name));
            if keyed.is_empty() {
                let key = from_env.ok_or_else(|| ToolError::missing_credential("api key"))?;
                headers.insert(header_name(DEFAULT_API_KEY_HEADER)?, secret_value(&key)?);
            } else {
                for (name, value) in keyed {
                    let value = from_env.as_deref().unwrap_or(value);
                    headers.insert(header_name(name)?, secret_value(value)?);
                }
            }
        }
        AuthDescriptor::Custom { headers: custom } => {
            for (name, value) in custom {
                headers.insert(header_name(name)?, secret_value(value)?);
            }
        }
    }
    Ok(())
}

fn resolve(explicit: Option<&str>, env_var: Option<&str>, env: &dyn EnvSource) -> Option<String> {
    env_var
        .and_then(|name| env.var(name))
        .or_else(|| explicit.filter(|v| !v.is_empty()).map(str::to_string))
}

pub(crate) fn header_name(name: &str) -> Result<HeaderName, ToolError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ToolError::InvalidHeader(name.to_string()))
}

fn secret_value(value: &str) -> Result<HeaderValue, ToolError> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| ToolError::InvalidHeader("credential value".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bearer_from_env() {
        let auth = AuthDescriptor::Bearer {
            token: None,
            env_var: Some("TOKEN".into()),
        };
        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[("TOKEN", "abc123")])).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc123");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_env_overrides_explicit_token() {
        let auth = AuthDescriptor::Bearer {
            token: Some("static".into()),
            env_var: Some("TOKEN".into()),
        };
        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[("TOKEN", "dynamic")])).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer dynamic");

        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[("TOKEN", "")])).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer static");
    }

    #[test]
    fn test_bearer_without_any_token_fails() {
        let auth = AuthDescriptor::Bearer {
            token: None,
            env_var: Some("UNSET".into()),
        };
        let err = apply_auth(&auth, &mut HeaderMap::new(), &env(&[])).unwrap_err();
        assert!(matches!(err, ToolError::MissingCredential(_)));
    }

    #[test]
    fn test_basic_auth() {
        let auth = AuthDescriptor::Basic {
            username: "alice".into(),
            password: Some("secret".into()),
            env_var: None,
        };
        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[])).unwrap();
        // base64("alice:secret")
        assert_eq!(headers[AUTHORIZATION], "Basic YWxpY2U6c2VjcmV0");
    }

    #[test]
    fn test_api_key_headers_overridden_by_env() {
        let auth = AuthDescriptor::ApiKey {
            headers: BTreeMap::from([("X-Key".to_string(), "config".to_string())]),
            env_var: Some("API_KEY".into()),
        };
        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[("API_KEY", "from-env")])).unwrap();
        assert_eq!(headers["x-key"], "from-env");
    }

    #[test]
    fn test_api_key_env_only_uses_default_header() {
        let auth = AuthDescriptor::ApiKey {
            headers: BTreeMap::new(),
            env_var: Some("API_KEY".into()),
        };
        let mut headers = HeaderMap::new();
        apply_auth(&auth, &mut headers, &env(&[("API_KEY", "k")])).unwrap();
        assert_eq!(headers[DEFAULT_API_KEY_HEADER], "k");
    }

    #[test]
    fn test_custom_headers_replace_existing() {
        let auth = AuthDescriptor::Custom {
            headers: BTreeMap::from([("Authorization".to_string(), "Token xyz".to_string())]),
        };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer configured"));
        apply_auth(&auth, &mut headers, &env(&[])).unwrap();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers[AUTHORIZATION], "Token xyz");
    }
}
