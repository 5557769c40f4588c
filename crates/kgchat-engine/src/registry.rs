use std::collections::HashMap;
use std::sync::Arc;

use kgchat_core::tools::{Tool, ToolDefinition};

/// Tools an agent may call, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(Arc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get tool definitions for the LLM.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kgchat_core::tools::{ToolContext, ToolError, ToolResult};

    struct DummyTool {
        name: String,
    }

    impl DummyTool {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "A dummy tool for testing"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(
            &self,
            _args: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text("ok"))
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(DummyTool::new("search")));
        reg.register(Arc::new(DummyTool::new("query_kg")));

        assert_eq!(reg.count(), 2);
        assert!(reg.contains("query_kg"));
        assert!(reg.get("search").is_some());
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn names_and_definitions_sorted() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(DummyTool::new("search")));
        reg.register(Arc::new(DummyTool::new("provide_feedback")));
        reg.register(Arc::new(DummyTool::new("query_kg")));

        assert_eq!(reg.names(), vec!["provide_feedback", "query_kg", "search"]);
        let defs = reg.definitions();
        assert_eq!(defs[0].name, "provide_feedback");
        assert_eq!(defs[2].name, "search");
    }

    #[test]
    fn reregister_replaces() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(DummyTool::new("query_kg")));
        reg.register(Arc::new(DummyTool::new("query_kg")));
        assert_eq!(reg.count(), 1);
    }
}
