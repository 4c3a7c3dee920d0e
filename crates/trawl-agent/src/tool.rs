//! Tool trait and registry

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use trawl_ai::ToolDefinition;

/// A tool-level failure. These never abort a run; the executor turns them
/// into tool-result messages the model can react to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Arguments missing, mistyped or rejected by the tool
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and failed
    #[error("{0}")]
    Failed(String),

    /// The requested tool is not registered
    #[error("Tool not found: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Create a failure from anything displayable
    pub fn failed(message: impl std::fmt::Display) -> Self {
        ToolError::Failed(message.to_string())
    }

    /// Create an argument error from anything displayable
    pub fn invalid(message: impl std::fmt::Display) -> Self {
        ToolError::InvalidArguments(message.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Failed(e.to_string())
    }
}

/// Trait for executable tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in API calls)
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// Type alias for a shared tool
pub type BoxedTool = Arc<dyn Tool>;

/// Convert a Tool to a definition for API calls
pub fn to_definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}

struct RegisteredTool {
    tool: BoxedTool,
    /// Compiled parameter schema; `None` when the schema itself is invalid
    validator: Option<Arc<jsonschema::Validator>>,
}

/// Explicit mapping from tool name to implementation.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier tool with the same name
    pub fn register(&mut self, tool: BoxedTool) {
        let schema = tool.parameters_schema();
        let validator = match jsonschema::validator_for(&schema) {
            Ok(validator) => Some(Arc::new(validator)),
            Err(e) => {
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    tool.name(),
                    e
                );
                None
            }
        };
        let name = tool.name().to_string();
        if self
            .tools
            .insert(name.clone(), RegisteredTool { tool, validator })
            .is_some()
        {
            tracing::debug!(tool = %name, "replaced previously registered tool");
        }
    }

    /// Builder-style registration
    pub fn with_tool(mut self, tool: BoxedTool) -> Self {
        self.register(tool);
        self
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<&BoxedTool, ToolError> {
        self.tools
            .get(name)
            .map(|entry| &entry.tool)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Validate arguments against the named tool's schema
    pub fn validate(&self, name: &str, arguments: &serde_json::Value) -> Result<(), ToolError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        match entry.validator.as_deref() {
            Some(validator) => validate_with_validator(arguments, validator),
            None => Ok(()),
        }
    }

    /// Registered tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions for every registered tool, for the model request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|entry| to_definition(entry.tool.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Validate tool arguments using a pre-compiled validator.
fn validate_with_validator(
    args: &serde_json::Value,
    validator: &jsonschema::Validator,
) -> Result<(), ToolError> {
    let errors: Vec<String> = validator
        .iter_errors(args)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", path, e)
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "argument validation failed:\n{}",
            errors.join("\n")
        )))
    }
}
