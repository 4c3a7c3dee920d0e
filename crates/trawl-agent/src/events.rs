//! Agent event types

use serde::{Deserialize, Serialize};
use trawl_ai::{Message, Usage};

/// Events emitted during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Run started from a seed
    RunStart {
        run_id: String,
        seed: String,
        started_at: i64,
    },

    /// A reasoning iteration started
    IterationStart { iteration: u32 },

    /// A reasoning attempt failed and will be retried
    RetryScheduled {
        attempt: u32,
        delay_ms: u64,
        error: String,
    },

    /// A message was appended to the transcript
    MessageAppended { message: Message },

    /// Tool execution started
    ToolExecutionStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// Tool execution completed
    ToolExecutionEnd {
        tool_call_id: String,
        tool_name: String,
        result: String,
        is_error: bool,
    },

    /// Run halted on the terminal marker
    RunEnd { iterations: u32, usage: Usage },

    /// Run failed
    Error { message: String },
}

impl AgentEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::RunEnd { .. } | AgentEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(AgentEvent::RunEnd { iterations: 3, usage: Usage::default() }.is_terminal());
        assert!(AgentEvent::Error { message: "x".into() }.is_terminal());
        assert!(!AgentEvent::IterationStart { iteration: 1 }.is_terminal());
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(AgentEvent::IterationStart { iteration: 2 }).unwrap();
        assert_eq!(json["type"], "iteration_start");
        assert_eq!(json["iteration"], 2);
    }
}
