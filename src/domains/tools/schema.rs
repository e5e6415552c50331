//! JSON Schema input descriptors for `tools/list`.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde_json::{Map, Value, json};

use super::descriptor::{ParameterDescriptor, ParameterKind, ToolDescriptor};

/// Build the `inputSchema` object for a tool.
///
/// Output is deterministic for a given descriptor: `properties` keys come out
/// sorted by name, while `required` keeps the declared parameter order.
pub fn input_schema(tool: &ToolDescriptor) -> JsonObject {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &tool.parameters {
        properties.insert(param.name.clone(), Value::Object(property_schema(param)));
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema
}

fn property_schema(param: &ParameterDescriptor) -> Map<String, Value> {
    let mut prop = Map::new();
    prop.insert("type".into(), json!(param.kind.as_str()));
    if !param.description.is_empty() {
        prop.insert("description".into(), json!(param.description));
    }

    if let Some(rules) = &param.validation {
        match param.kind {
            ParameterKind::String => {
                if let Some(min) = rules.min_length {
                    prop.insert("minLength".into(), json!(min));
                }
                if let Some(max) = rules.max_length {
                    prop.insert("maxLength".into(), json!(max));
                }
                if let Some(pattern) = &rules.pattern {
                    prop.insert("pattern".into(), json!(pattern));
                }
                if !rules.enum_values.is_empty() {
                    prop.insert("enum".into(), json!(rules.enum_values));
                }
            }
            ParameterKind::Number => {
                if let Some(min) = rules.min_value {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = rules.max_value {
                    prop.insert("maximum".into(), json!(max));
                }
            }
            ParameterKind::Boolean | ParameterKind::Object | ParameterKind::Array => {}
        }
    }

    if let Some(default) = &param.default {
        prop.insert("default".into(), default.clone());
    }
    prop
}

/// MCP tool metadata for a descriptor.
pub fn to_tool(tool: &ToolDescriptor) -> Tool {
    Tool {
        name: tool.name.clone().into(),
        description: Some(tool.description.clone().into()),
        input_schema: Arc::new(input_schema(tool)),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::descriptor::ParameterValidation;

    #[test]
    fn test_schema_maps_constraints() {
        let mut tool = ToolDescriptor::new("search", "Search", "https://api.example.com");
        let mut q = ParameterDescriptor::new("q", ParameterKind::String, true);
        q.description = "Query text".into();
        q.validation = Some(ParameterValidation {
            min_length: Some(1),
            pattern: Some("^\\w+$".into()),
            enum_values: vec!["a".into(), "b".into()],
            ..Default::default()
        });
        let mut limit = ParameterDescriptor::new("limit", ParameterKind::Number, false);
        limit.default = Some(json!(10));
        limit.validation = Some(ParameterValidation {
            min_value: Some(1.0),
            max_value: Some(50.0),
            min_length: Some(3),
            ..Default::default()
        });
        tool.parameters = vec![q, limit];

        let schema = Value::Object(input_schema(&tool));
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "q": {
                        "type": "string",
                        "description": "Query text",
                        "minLength": 1,
                        "pattern": "^\\w+$",
                        "enum": ["a", "b"]
                    },
                    "limit": {
                        "type": "number",
                        "minimum": 1.0,
                        "maximum": 50.0,
                        "default": 10
                    }
                },
                "required": ["q"]
            })
        );
    }

    #[test]
    fn test_properties_sorted_required_declared() {
        let mut tool = ToolDescriptor::new("t", "d", "https://api.example.com");
        for name in ["zeta", "alpha"] {
            tool.parameters
                .push(ParameterDescriptor::new(name, ParameterKind::String, true));
        }

        let schema = input_schema(&tool);
        let keys: Vec<_> = schema["properties"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
        assert_eq!(schema["required"], json!(["zeta", "alpha"]));
    }

    #[test]
    fn test_no_required_list_when_all_optional() {
        let mut tool = ToolDescriptor::new("t", "d", "https://api.example.com");
        tool.parameters = vec![ParameterDescriptor::new("flag", ParameterKind::Boolean, false)];
        let schema = input_schema(&tool);
        assert!(!schema.contains_key("required"));
    }

    #[test]
    fn test_to_tool() {
        let tool = to_tool(&ToolDescriptor::new("t", "desc", "https://api.example.com"));
        assert_eq!(tool.name, "t");
        assert_eq!(tool.input_schema.get("type"), Some(&json!("object")));
    }
}
