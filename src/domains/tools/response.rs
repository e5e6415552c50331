//! Response Processor & Validator.

use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::transport::RawResponse;

/// The processed result of one tool call. Never shared across calls.
#[derive(Debug, Clone)]
pub struct ApiOutcome {
    pub status: u16,
    /// First value per header name.
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Parsed payload when the response declared JSON and the body parsed.
    pub data: Option<Value>,
}

impl ApiOutcome {
    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }
}

/// Turn a raw response into an [`ApiOutcome`] and apply the tool's
/// response validation rules.
pub fn process_response(tool: &ToolDescriptor, raw: RawResponse) -> Result<ApiOutcome, ToolError> {
    let mut headers = BTreeMap::new();
    for (name, value) in raw.headers.iter() {
        headers
            .entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let is_json = raw
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_json_content_type);

    let body = String::from_utf8_lossy(&raw.body).into_owned();
    let data = if is_json && !body.trim().is_empty() {
        serde_json::from_str(&body).ok()
    } else {
        None
    };

    let outcome = ApiOutcome {
        status: raw.status,
        headers,
        body,
        data,
    };
    validate(tool, &outcome)?;
    Ok(outcome)
}

fn validate(tool: &ToolDescriptor, outcome: &ApiOutcome) -> Result<(), ToolError> {
    let Some(rules) = &tool.validation else {
        return Ok(());
    };

    if !rules.status_codes.is_empty() && !rules.status_codes.contains(&outcome.status) {
        return Err(ToolError::response_validation(format!(
            "unexpected status code {}",
            outcome.status
        )));
    }

    if !rules.required_fields.is_empty() {
        let object = outcome
            .data
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| ToolError::response_validation("response is not a JSON object"))?;
        if let Some(missing) = rules.required_fields.iter().find(|f| !object.contains_key(*f)) {
            return Err(ToolError::response_validation(format!(
                "missing required field '{}'",
                missing
            )));
        }
    }

    Ok(())
}

fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}
