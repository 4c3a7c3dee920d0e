//! trawl-agent: reasoning/action control loop
//!
//! This crate provides the loop that asks a model to reason over a growing
//! transcript, runs the tools it requests, feeds the results back and stops
//! once the model answers with the terminal marker.

pub mod admission;
pub mod agent;
pub mod error;
pub mod events;
pub mod executor;
pub mod reasoning;
pub mod router;
pub mod tool;
pub mod transcript;
pub mod transport;

pub use admission::{AdmissionConfig, AdmissionGate};
pub use agent::{Agent, AgentConfig, RunOutcome};
pub use error::{Error, Result};
pub use events::AgentEvent;
pub use executor::ToolExecutor;
pub use reasoning::ReasoningStep;
pub use router::{AmbiguousContentPolicy, Edge, Router, TERMINAL_MARKER};
pub use tool::{BoxedTool, Tool, ToolError, ToolRegistry};
pub use transcript::Transcript;
pub use transport::{ProviderTransport, RetryConfig, Transport};
