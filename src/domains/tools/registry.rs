//! Tool Registry - the immutable set of configured tools.
//!
//! Built once at startup from the manifest and shared by reference; it is
//! never mutated afterwards, so concurrent readers need no locking.

use std::collections::HashMap;

use rmcp::model::Tool;
use tracing::warn;

use super::descriptor::ToolDescriptor;
use super::schema::to_tool;

// ============================================================================
// Tool Registry
// ============================================================================

/// Configured tools in manifest order, indexed by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a registry from descriptors.
    ///
    /// Names are expected to be unique already; a duplicate is dropped and
    /// the first definition kept.
    pub fn new(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut tools = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());
        for tool in descriptors {
            if index.contains_key(&tool.name) {
                warn!("Duplicate tool name ignored: {}", tool.name);
                continue;
            }
            index.insert(tool.name.clone(), tools.len());
            tools.push(tool);
        }
        Self { tools, index }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Get all tool names, in manifest order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// All descriptors, in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both the HTTP and the stdio transports list tools through this.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(to_tool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(vec![
            ToolDescriptor::new("get_item", "first", "https://api.example.com/items"),
            ToolDescriptor::new("create_item", "second", "https://api.example.com/items"),
            ToolDescriptor::new("get_item", "duplicate", "https://api.example.com/other"),
        ])
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.get("get_item").unwrap().description, "first");
        assert_eq!(registry.get("create_item").unwrap().description, "second");
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_registry_tool_names_in_order() {
        let registry = registry();
        assert_eq!(registry.tool_names(), vec!["get_item", "create_item"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_list_tools_is_stable() {
        let registry = registry();
        let first = serde_json::to_value(registry.list_tools()).unwrap();
        let second = serde_json::to_value(registry.list_tools()).unwrap();
        assert_eq!(first, second);
    }
}
