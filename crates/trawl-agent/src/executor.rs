//! Tool execution

use tokio::sync::broadcast;
use trawl_ai::{Message, ToolCall};

use crate::{
    events::AgentEvent,
    tool::{ToolError, ToolRegistry},
};

/// Runs the tool calls requested by one assistant message.
///
/// Calls run one after another in the order the model listed them, and
/// every call yields exactly one tool message carrying its request id.
/// A failing tool never fails the batch.
#[derive(Default)]
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    /// Execute every call and return the result messages in request order
    pub async fn execute(
        &self,
        calls: &[ToolCall],
        events: &broadcast::Sender<AgentEvent>,
    ) -> Vec<Message> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let _ = events.send(AgentEvent::ToolExecutionStart {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                arguments: call.arguments.clone(),
            });

            let message = match self.execute_one(call).await {
                Ok(output) => Message::tool_output(&call.id, &call.name, output),
                Err(e) => {
                    tracing::warn!(tool = %call.name, id = %call.id, "tool failed: {}", e);
                    Message::tool_error(&call.id, &call.name, e.to_string())
                }
            };

            let _ = events.send(AgentEvent::ToolExecutionEnd {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                result: message.text(),
                is_error: message.is_error(),
            });
            results.push(message);
        }

        results
    }

    async fn execute_one(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self.registry.resolve(&call.name)?;
        self.registry.validate(&call.name, &call.arguments)?;
        tracing::debug!(tool = %call.name, id = %call.id, "executing tool");
        tool.execute(call.arguments.clone()).await
    }
}
