//! Prompt templates module.
//!
//! Prompts come from the manifest. Their content uses `{name}` placeholders
//! that are replaced with the string arguments supplied to `prompts/get`.

use rmcp::model::{Prompt, PromptArgument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::PromptError;

/// A static prompt as declared in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// The unique name of the prompt.
    pub name: String,

    /// A description of what the prompt does.
    #[serde(default)]
    pub description: String,

    /// The prompt text with `{argument}` placeholders.
    pub content: String,

    /// The arguments that this prompt accepts.
    #[serde(default)]
    pub arguments: Vec<PromptArgumentSpec>,
}

/// One declared prompt argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgumentSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,
}

impl PromptTemplate {
    /// Render the content with the given arguments.
    ///
    /// Every required argument must be supplied. Placeholders naming an
    /// argument that was not supplied are left as they are, and substituted
    /// values are never scanned again.
    pub fn render(&self, arguments: &HashMap<String, String>) -> Result<String, PromptError> {
        if let Some(missing) = self
            .arguments
            .iter()
            .find(|arg| arg.required && !arguments.contains_key(&arg.name))
        {
            return Err(PromptError::missing_argument(&missing.name));
        }

        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open + 1..];
            let value = candidate
                .find('}')
                .and_then(|close| arguments.get(&candidate[..close]).map(|v| (close, v)));

            match value {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &candidate[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = candidate;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    /// MCP prompt metadata.
    pub fn to_prompt(&self) -> Prompt {
        Prompt {
            name: self.name.clone(),
            title: None,
            description: Some(self.description.clone()),
            arguments: Some(
                self.arguments
                    .iter()
                    .map(|arg| PromptArgument {
                        name: arg.name.clone(),
                        title: None,
                        description: Some(arg.description.clone()),
                        required: Some(arg.required),
                    })
                    .collect(),
            ),
            icons: None,
            meta: None,
        }
    }
}

/// Builder for creating prompt templates in code.
pub struct PromptTemplateBuilder {
    name: String,
    description: String,
    arguments: Vec<PromptArgumentSpec>,
    content: String,
}

impl PromptTemplateBuilder {
    /// Create a new builder with the required name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            arguments: Vec::new(),
            content: String::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a required argument.
    pub fn required_arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arguments.push(PromptArgumentSpec {
            name: name.into(),
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional argument.
    pub fn optional_arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arguments.push(PromptArgumentSpec {
            name: name.into(),
            description: description.into(),
            required: false,
        });
        self
    }

    /// Set the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Build the prompt template.
    pub fn build(self) -> PromptTemplate {
        PromptTemplate {
            name: self.name,
            description: self.description,
            content: self.content,
            arguments: self.arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_substitution() {
        let template = PromptTemplateBuilder::new("test")
            .content("Hello, {name}!")
            .build();
        let result = template.render(&args(&[("name", "World")])).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_unknown_placeholders_and_braces_kept() {
        let template = PromptTemplateBuilder::new("test")
            .content("{greeting} {name}: {\"json\": true}")
            .build();
        let result = template.render(&args(&[("name", "Ada")])).unwrap();
        assert_eq!(result, "{greeting} Ada: {\"json\": true}");
    }

    #[test]
    fn test_values_not_rescanned() {
        let template = PromptTemplateBuilder::new("test")
            .content("{a}{b}")
            .build();
        let result = template.render(&args(&[("a", "{b}"), ("b", "x")])).unwrap();
        assert_eq!(result, "{b}x");
    }

    #[test]
    fn test_missing_required_argument() {
        let template = PromptTemplateBuilder::new("test")
            .required_arg("code", "Code to review")
            .content("Review {code}")
            .build();
        let err = template.render(&HashMap::new()).unwrap_err();
        assert!(matches!(err, PromptError::MissingArgument(ref name) if name == "code"));
    }

    #[test]
    fn test_deserialize_from_manifest() {
        let template: PromptTemplate = serde_json::from_value(serde_json::json!({
            "name": "summarize",
            "description": "Summarize text",
            "content": "Summarize: {text}",
            "arguments": [{ "name": "text", "required": true }]
        }))
        .unwrap();

        let prompt = template.to_prompt();
        assert_eq!(prompt.name, "summarize");
        let arguments = prompt.arguments.unwrap();
        assert_eq!(arguments[0].name, "text");
        assert_eq!(arguments[0].required, Some(true));
    }
}
