//! Routing: decide what happens after each reasoning step.

use serde::{Deserialize, Serialize};
use trawl_ai::Message;

use crate::error::{Error, Result};

/// The literal the model answers with once it is done
pub const TERMINAL_MARKER: &str = "END";

/// The next control-flow edge after a reasoning step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Run the pending tool calls, then reason again
    InvokeTools,
    /// Ask the model again
    InvokeReasoning,
    /// Stop the run
    Halt,
}

/// What to do with content that has no text to compare, such as an empty
/// block list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousContentPolicy {
    /// Keep reasoning
    #[default]
    Continue,
    /// Fail the run with [`Error::MalformedTermination`]
    Fail,
}

/// Pure classifier over the latest transcript message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    marker: String,
    ambiguous: AmbiguousContentPolicy,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(TERMINAL_MARKER)
    }
}

impl Router {
    /// Create a router that halts on `marker`
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            ambiguous: AmbiguousContentPolicy::default(),
        }
    }

    /// Set the policy for content the router cannot classify
    pub fn with_ambiguous_policy(mut self, policy: AmbiguousContentPolicy) -> Self {
        self.ambiguous = policy;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Classify a message.
    ///
    /// Tool calls win over any content. Otherwise the trimmed termination
    /// text must equal the marker exactly (case-sensitive) to halt; anything
    /// else asks the model again.
    pub fn route(&self, message: &Message) -> Result<Edge> {
        if !message.tool_calls().is_empty() {
            return Ok(Edge::InvokeTools);
        }

        let Some(content) = message.content() else {
            return Ok(Edge::InvokeReasoning);
        };

        match content.termination_text() {
            Some(text) if text.trim() == self.marker => Ok(Edge::Halt),
            Some(_) => Ok(Edge::InvokeReasoning),
            None => match self.ambiguous {
                AmbiguousContentPolicy::Continue => {
                    tracing::debug!("content has no blocks to compare, continuing");
                    Ok(Edge::InvokeReasoning)
                }
                AmbiguousContentPolicy::Fail => Err(Error::MalformedTermination(
                    "structured content with no blocks".to_string(),
                )),
            },
        }
    }
}
