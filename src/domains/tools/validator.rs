//! Call-time parameter validation.
//!
//! [`validate_arguments`] checks every declared parameter of a tool against the
//! caller's arguments, in declaration order, and stops at the first failure.
//!
//! **Contract:** on success the argument map has been mutated in place: each
//! optional parameter that was absent and declares a default now carries that
//! default, so template expansion sees it. On failure the map may already hold
//! defaults for parameters declared before the failing one; callers discard it.

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::descriptor::{ParameterDescriptor, ParameterKind, ToolDescriptor};

/// A parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("missing required parameter '{0}'")]
    Missing(String),

    #[error("parameter '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: ParameterKind,
        actual: &'static str,
    },

    #[error("parameter '{name}': {reason}")]
    Constraint { name: String, reason: String },
}

impl ParameterError {
    /// Name of the offending parameter.
    pub fn parameter(&self) -> &str {
        match self {
            Self::Missing(name) => name,
            Self::TypeMismatch { name, .. } | Self::Constraint { name, .. } => name,
        }
    }

    fn constraint(param: &ParameterDescriptor, reason: impl Into<String>) -> Self {
        Self::Constraint {
            name: param.name.clone(),
            reason: reason.into(),
        }
    }

    fn mismatch(param: &ParameterDescriptor, actual: &'static str) -> Self {
        Self::TypeMismatch {
            name: param.name.clone(),
            expected: param.kind,
            actual,
        }
    }
}

/// Validate `args` against the tool's declared parameters and inject defaults.
pub fn validate_arguments(
    tool: &ToolDescriptor,
    args: &mut Map<String, Value>,
) -> Result<(), ParameterError> {
    for param in &tool.parameters {
        match args.get(&param.name) {
            Some(value) => validate_value(param, value)?,
            None if param.required => return Err(ParameterError::Missing(param.name.clone())),
            None => {
                if let Some(default) = &param.default {
                    args.insert(param.name.clone(), default.clone());
                }
            }
        }
    }
    Ok(())
}

/// Check one value against its parameter's type and constraints.
pub fn validate_value(param: &ParameterDescriptor, value: &Value) -> Result<(), ParameterError> {
    match param.kind {
        ParameterKind::String => {
            let text = value
                .as_str()
                .ok_or_else(|| ParameterError::mismatch(param, json_type_name(value)))?;
            check_string(param, text)
        }
        ParameterKind::Number => {
            let number = as_number(value).ok_or_else(|| {
                let actual = if value.is_string() {
                    "non-numeric string"
                } else {
                    json_type_name(value)
                };
                ParameterError::mismatch(param, actual)
            })?;
            check_number(param, number)
        }
        ParameterKind::Boolean if value.is_boolean() => Ok(()),
        ParameterKind::Object if value.is_object() => Ok(()),
        ParameterKind::Array if value.is_array() => Ok(()),
        ParameterKind::Boolean | ParameterKind::Object | ParameterKind::Array => {
            Err(ParameterError::mismatch(param, json_type_name(value)))
        }
    }
}

fn check_string(param: &ParameterDescriptor, text: &str) -> Result<(), ParameterError> {
    let Some(rules) = &param.validation else {
        return Ok(());
    };

    let length = text.chars().count();
    if let Some(min) = rules.min_length
        && length < min
    {
        return Err(ParameterError::constraint(
            param,
            format!("string too short, minimum length is {}", min),
        ));
    }
    if let Some(max) = rules.max_length
        && length > max
    {
        return Err(ParameterError::constraint(
            param,
            format!("string too long, maximum length is {}", max),
        ));
    }

    if let Some(pattern) = &rules.pattern {
        let regex = Regex::new(pattern).map_err(|e| {
            ParameterError::constraint(param, format!("invalid pattern {}: {}", pattern, e))
        })?;
        if !regex.is_match(text) {
            return Err(ParameterError::constraint(
                param,
                format!("value does not match pattern {}", pattern),
            ));
        }
    }

    if !rules.enum_values.is_empty() && !rules.enum_values.iter().any(|v| v == text) {
        return Err(ParameterError::constraint(
            param,
            format!("value must be one of: {}", rules.enum_values.join(", ")),
        ));
    }

    Ok(())
}

fn check_number(param: &ParameterDescriptor, number: f64) -> Result<(), ParameterError> {
    let Some(rules) = &param.validation else {
        return Ok(());
    };

    if let Some(min) = rules.min_value
        && number < min
    {
        return Err(ParameterError::constraint(
            param,
            format!("number too small, minimum value is {}", min),
        ));
    }
    if let Some(max) = rules.max_value
        && number > max
    {
        return Err(ParameterError::constraint(
            param,
            format!("number too large, maximum value is {}", max),
        ));
    }

    Ok(())
}

/// Numbers are accepted natively or as numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
