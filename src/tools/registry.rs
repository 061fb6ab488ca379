use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{
    builtin,
    errors::{ToolBuilderError, ToolExecutionError},
    tool::{AsyncToolFn, Tool, ToolDefinition, ToolOutput},
    tool_builder::ToolBuilder,
};

/// Name-keyed catalog of tools, kept in registration order.
///
/// Registering under an existing name replaces that tool in place.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with `calculate`, `get_current_time`, `read_file`
    /// and `string_length`.
    pub fn with_common_tools() -> Self {
        let mut registry = Self::new();
        registry.register_common_tools();
        registry
    }

    pub fn register_common_tools(&mut self) -> &mut Self {
        for tool in builtin::common_tools() {
            self.register(tool);
        }
        self
    }

    pub fn register(&mut self, tool: Tool) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Build and register a tool from a JSON parameter declaration.
    /// See [`ToolBuilder::parameters`] for the accepted forms.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        executor: AsyncToolFn,
    ) -> Result<&mut Self, ToolBuilderError> {
        let tool = ToolBuilder::new()
            .function_name(name)
            .function_description(description)
            .parameters(parameters)
            .executor(executor)
            .build()?;
        Ok(self.register(tool))
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn unregister(&mut self, name: &str) -> Option<Tool> {
        self.tools.shift_remove(name)
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    /// Definitions in the shape embedded in a chat request, registration order.
    pub fn tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(Tool::definition).collect()
    }

    /// Look up `name`, validate `args` against its schema, then run it.
    #[instrument(level = "debug", skip(self, args))]
    pub async fn execute(&self, name: &str, args: &Value) -> Result<ToolOutput, ToolExecutionError> {
        let Some(tool) = self.tools.get(name) else {
            warn!(target: "tool", tool = name, "Tool not found");
            return Err(ToolExecutionError::ToolNotFound(name.to_string()));
        };

        info!(target: "tool", tool = name, args = %args, "Executing tool");
        let result = tool.execute(args).await;
        match &result {
            Ok(output) => info!(target: "tool", tool = name, result = %output.to_content(), "Tool finished"),
            Err(e) => warn!(target: "tool", tool = name, error = %e, "Tool failed"),
        }
        result
    }
}
