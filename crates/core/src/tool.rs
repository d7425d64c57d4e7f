//! Tool trait and registry.
//!
//! Tools give the agent the ability to act: read and write files, run
//! commands, scaffold projects, search memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use crate::schema;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// A failed execution, rendered the way the model sees it.
    pub fn from_error(err: &ToolError) -> Self {
        Self {
            call_id: String::new(),
            success: false,
            output: format!("Error: {err}"),
            data: None,
        }
    }
}

/// Decode tool arguments into a typed record.
pub fn parse_args<T: serde::de::DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The core Tool trait.
///
/// Handlers report failure through `ToolError`; the registry turns that into
/// model-visible text so nothing escapes to the orchestrator.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "inspect_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by unique name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool call.
    ///
    /// Unknown names and schema violations are returned as errors before any
    /// handler runs. Failures inside the handler come back as an unsuccessful
    /// `ToolResult` carrying the error text.
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        schema::validate(&tool.parameters_schema(), &call.arguments)
            .map_err(|reason| ToolError::InvalidArguments(format!("{}: {reason}", call.name)))?;

        let mut result = match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "Tool handler failed");
                ToolResult::from_error(&e)
            }
        };
        result.call_id = call.id.clone();
        Ok(result)
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
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
    use serde::Deserialize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
        #[serde(default)]
        repeat: Option<u32>,
    }

    /// Echoes its input; counts how often the handler actually ran.
    struct EchoTool {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "repeat": { "type": "integer", "minimum": 1, "maximum": 3 }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let args: EchoArgs = parse_args(arguments)?;
            if args.text == "boom" {
                return Err(ToolError::failed("echo", "exploded"));
            }
            Ok(ToolResult::ok(args.text.repeat(args.repeat.unwrap_or(1) as usize)))
        }
    }

    fn registry() -> (ToolRegistry, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(Box::new(EchoTool { runs: runs.clone() }))
            .unwrap();
        (registry, runs)
    }

    fn call(arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments,
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let (registry, _) = registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        let (mut registry, runs) = registry();
        let err = registry.register(Box::new(EchoTool { runs })).unwrap_err();
        assert!(matches!(err, ToolError::AlreadyRegistered(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_definitions() {
        let (registry, _) = registry();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["required"][0], "text");
    }

    #[tokio::test]
    async fn invoke_runs_handler_and_sets_call_id() {
        let (registry, _) = registry();
        let result = registry
            .invoke(&call(serde_json::json!({"text": "hi", "repeat": 2})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hihi");
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let mut c = call(serde_json::json!({}));
        c.name = "nonexistent".into();
        let err = registry.invoke(&c).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn schema_violation_never_reaches_handler() {
        let (registry, runs) = registry();
        let err = registry
            .invoke(&call(serde_json::json!({"text": 42})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let err = registry
            .invoke(&call(serde_json::json!({"text": "x", "repeat": 9})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_becomes_result_text() {
        let (registry, _) = registry();
        let result = registry
            .invoke(&call(serde_json::json!({"text": "boom"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
        assert!(result.output.contains("exploded"));
        assert_eq!(result.call_id, "call_1");
    }
}
