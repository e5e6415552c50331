//! Placeholder expansion for endpoint, query, header and body templates.
//!
//! Templates use the `{{.name}}` action syntax. A dotted path (`{{.user.id}}`)
//! walks into nested objects. Every action must resolve: a missing key is an
//! error, never an empty substitution.

use serde_json::{Map, Value};
use std::borrow::Cow;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Errors raised while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{{` without a matching `}}`.
    #[error("unclosed action starting at byte {0}")]
    Unclosed(usize),

    /// The action is not a `.path` reference.
    #[error("unsupported action '{{{{{0}}}}}': expected a .field reference")]
    Unsupported(String),

    /// The referenced argument does not exist.
    #[error("no value for '.{0}'")]
    MissingKey(String),
}

/// Expand every placeholder in `template` against `args`.
///
/// Templates without placeholders are returned borrowed and unchanged.
pub fn expand<'a>(
    template: &'a str,
    args: &Map<String, Value>,
) -> Result<Cow<'a, str>, TemplateError> {
    if !template.contains(OPEN) {
        return Ok(Cow::Borrowed(template));
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unclosed(offset + start))?;

        let action = after_open[..end].trim();
        let value = resolve(action, args)?;
        render_into(&mut out, value);

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    Ok(Cow::Owned(out))
}

/// Render a JSON value the way it appears inside expanded text.
///
/// Strings are inserted raw, `null` renders empty, and objects or arrays are
/// written as compact JSON.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    render_into(&mut out, value);
    out
}

/// Root argument names referenced by `template`, in order of appearance.
///
/// Malformed or unsupported actions are skipped; [`expand`] reports them.
pub fn referenced_keys(template: &str) -> Vec<&str> {
    let mut keys = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        if let Some(root) = after_open[..end]
            .trim()
            .strip_prefix('.')
            .and_then(|path| path.split('.').next())
            .filter(|root| !root.is_empty())
        {
            keys.push(root);
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    keys
}

fn resolve<'v>(
    action: &str,
    args: &'v Map<String, Value>,
) -> Result<&'v Value, TemplateError> {
    let path = action
        .strip_prefix('.')
        .filter(|p| !p.is_empty())
        .ok_or_else(|| TemplateError::Unsupported(action.to_string()))?;

    let mut segments = path.split('.');
    // split always yields at least one segment
    let first = segments.next().unwrap_or_default();
    let mut current = args
        .get(first)
        .ok_or_else(|| TemplateError::MissingKey(path.to_string()))?;

    for segment in segments {
        current = current
            .as_object()
            .and_then(|obj| obj.get(segment))
            .ok_or_else(|| TemplateError::MissingKey(path.to_string()))?;
    }

    Ok(current)
}

fn render_into(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_literal_is_borrowed() {
        let result = expand("https://api.example.com/items", &Map::new()).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "https://api.example.com/items");
    }

    #[test]
    fn test_simple_substitution() {
        let a = args(json!({ "id": "42" }));
        let result = expand("https://api.example.com/items/{{.id}}", &a).unwrap();
        assert_eq!(result, "https://api.example.com/items/42");
    }

    #[test]
    fn test_whitespace_and_multiple_actions() {
        let a = args(json!({ "owner": "rust-lang", "repo": "rust" }));
        let result = expand("/repos/{{ .owner }}/{{.repo}}/issues", &a).unwrap();
        assert_eq!(result, "/repos/rust-lang/rust/issues");
    }

    #[test]
    fn test_scalar_rendering() {
        let a = args(json!({ "n": 42, "f": 1.5, "b": true, "z": null }));
        let result = expand("{{.n}}|{{.f}}|{{.b}}|{{.z}}", &a).unwrap();
        assert_eq!(result, "42|1.5|true|");
    }

    #[test]
    fn test_body_template_with_nested_path_and_object() {
        let a = args(json!({ "user": { "id": 7 }, "tags": ["a", "b"] }));
        let result = expand(r#"{"uid": {{.user.id}}, "tags": {{.tags}}}"#, &a).unwrap();
        assert_eq!(result, r#"{"uid": 7, "tags": ["a","b"]}"#);
    }

    #[test]
    fn test_missing_key_is_error() {
        let err = expand("/items/{{.id}}", &Map::new()).unwrap_err();
        assert_eq!(err, TemplateError::MissingKey("id".to_string()));
    }

    #[test]
    fn test_missing_nested_key_is_error() {
        let a = args(json!({ "user": "flat" }));
        let err = expand("{{.user.id}}", &a).unwrap_err();
        assert_eq!(err, TemplateError::MissingKey("user.id".to_string()));
    }

    #[test]
    fn test_unclosed_action() {
        let a = args(json!({ "id": 1 }));
        let err = expand("/a/{{.id}}/b/{{.id", &a).unwrap_err();
        assert_eq!(err, TemplateError::Unclosed(13));
    }

    #[test]
    fn test_referenced_keys() {
        let keys = referenced_keys("/u/{{.user.id}}/{{ .repo }}/{{bad}}/{{.open");
        assert_eq!(keys, vec!["user", "repo"]);
        assert!(referenced_keys("plain").is_empty());
    }

    #[test]
    fn test_unsupported_action() {
        let a = args(json!({ "id": 1 }));
        let err = expand("{{id}}", &a).unwrap_err();
        assert!(matches!(err, TemplateError::Unsupported(_)));
        assert!(err.to_string().contains("{{id}}"));
    }
}
