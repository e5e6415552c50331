//! Prompt service implementation.
//!
//! The PromptService serves the static prompts loaded from the manifest, in
//! manifest order, and handles argument substitution.

use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};
use std::collections::HashMap;
use tracing::info;

use super::error::PromptError;
use super::templates::PromptTemplate;

/// Service for listing and instantiating prompts.
#[derive(Debug, Default)]
pub struct PromptService {
    /// Prompts in manifest order.
    prompts: Vec<PromptTemplate>,

    /// Key: prompt name, Value: position in `prompts`.
    index: HashMap<String, usize>,
}

impl PromptService {
    /// Create a new PromptService over the given prompts.
    pub fn new(templates: Vec<PromptTemplate>) -> Self {
        info!("Initializing PromptService");

        let mut service = Self::default();
        for template in templates {
            service.register_prompt(template);
        }
        service
    }

    /// Register a prompt template. A later prompt with the same name replaces
    /// the earlier one in place.
    pub fn register_prompt(&mut self, template: PromptTemplate) {
        info!("Registering prompt: {}", template.name);
        match self.index.get(&template.name) {
            Some(&position) => self.prompts[position] = template,
            None => {
                self.index.insert(template.name.clone(), self.prompts.len());
                self.prompts.push(template);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// List all available prompts.
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts.iter().map(PromptTemplate::to_prompt).collect()
    }

    /// Get a prompt with arguments substituted.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult, PromptError> {
        let template = self
            .index
            .get(name)
            .map(|&i| &self.prompts[i])
            .ok_or_else(|| PromptError::not_found(name))?;

        let arguments = arguments.unwrap_or_default();
        info!(prompt = name, "Getting prompt");
        let content = template.render(&arguments)?;

        Ok(GetPromptResult {
            description: Some(template.description.clone()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, content)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::templates::PromptTemplateBuilder;

    fn service() -> PromptService {
        PromptService::new(vec![
            PromptTemplateBuilder::new("greeting")
                .description("Greet someone")
                .required_arg("name", "Who to greet")
                .content("Hello, {name}!")
                .build(),
            PromptTemplateBuilder::new("explain")
                .optional_arg("topic", "Topic")
                .content("Explain {topic}")
                .build(),
        ])
    }

    #[test]
    fn test_list_prompts_in_order() {
        let prompts = service().list_prompts();
        let names: Vec<_> = prompts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["greeting", "explain"]);
    }

    #[test]
    fn test_get_prompt() {
        let args = HashMap::from([("name".to_string(), "Ada".to_string())]);
        let result = service().get_prompt("greeting", Some(args)).unwrap();
        assert_eq!(result.description.as_deref(), Some("Greet someone"));
        assert_eq!(result.messages.len(), 1);

        let json = serde_json::to_value(&result.messages[0]).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"]["text"], "Hello, Ada!");
    }

    #[test]
    fn test_get_unknown_prompt() {
        let err = service().get_prompt("unknown", None).unwrap_err();
        assert!(matches!(err, PromptError::NotFound(_)));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = service().get_prompt("greeting", None).unwrap_err();
        assert!(matches!(err, PromptError::MissingArgument(_)));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut service = service();
        service.register_prompt(PromptTemplateBuilder::new("greeting").content("Hi").build());
        assert_eq!(service.len(), 2);
        let result = service.get_prompt("greeting", None).unwrap();
        let json = serde_json::to_value(&result.messages[0]).unwrap();
        assert_eq!(json["content"]["text"], "Hi");
    }
}
